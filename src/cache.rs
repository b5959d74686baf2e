//! C9 — suggestion cache.
//!
//! Caches the decision engine's output for a (deal, round, offer)
//! fingerprint so that re-evaluating an unchanged offer (e.g. a UI
//! refresh before the vendor has replied) doesn't re-run drafting or
//! re-score. Bounded LRU with a TTL, guarded by a synchronous lock that
//! is never held across an `.await` — the cache itself does no I/O.

use crate::types::Decision;
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default cache capacity.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default time-to-live for a cached suggestion.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Key identifying one (deal, round, offer-content) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuggestionKey {
    deal_id: Uuid,
    round: u32,
    offer_fingerprint: u64,
}

impl SuggestionKey {
    /// Build a key from a deal, round, and the offer the decision was
    /// computed from.
    pub fn new(deal_id: Uuid, round: u32, offer: &crate::types::Offer) -> Self {
        Self {
            deal_id,
            round,
            offer_fingerprint: fingerprint(offer),
        }
    }
}

fn fingerprint(offer: &crate::types::Offer) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    offer.total_price.map(|p| p.to_bits()).hash(&mut hasher);
    offer.payment_terms.hash(&mut hasher);
    offer.delivery_date.hash(&mut hasher);
    offer.delivery_days.hash(&mut hasher);
    offer
        .advance_payment_percent
        .map(|p| p.to_bits())
        .hash(&mut hasher);
    offer.warranty_months.hash(&mut hasher);
    hasher.finish()
}

struct Entry {
    decision: Decision,
    inserted_at: Instant,
}

/// A bounded, TTL-expiring cache of decisions keyed by
/// [`SuggestionKey`]. Cheap to clone (wraps an `Arc` internally via
/// `Mutex` sharing is left to the caller — this type itself is not
/// `Clone`; share it behind an `Arc`).
pub struct SuggestionCache {
    inner: Mutex<LruCache<SuggestionKey, Entry>>,
    ttl: Duration,
}

impl SuggestionCache {
    /// A cache with `DEFAULT_CAPACITY` and `DEFAULT_TTL`.
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// A cache with an explicit capacity and TTL.
    pub fn with_capacity_and_ttl(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Look up a cached decision, evicting it first if it has expired.
    /// Uses `peek`, never `get` — a lookup must not touch recency, since
    /// eviction on overflow is by insertion order, not by last access.
    pub fn get(&self, key: &SuggestionKey) -> Option<Decision> {
        let mut guard = self.inner.lock();
        match guard.peek(key) {
            Some(entry) if entry.inserted_at.elapsed() > self.ttl => {
                guard.pop(key);
                None
            }
            Some(entry) => Some(entry.decision.clone()),
            None => None,
        }
    }

    /// Insert or refresh the cached decision for `key`.
    pub fn put(&self, key: SuggestionKey, decision: Decision) {
        let mut guard = self.inner.lock();
        guard.put(
            key,
            Entry {
                decision,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every cached entry for a deal, e.g. once it concludes.
    pub fn invalidate_deal(&self, deal_id: Uuid) {
        let mut guard = self.inner.lock();
        let stale: Vec<SuggestionKey> = guard
            .iter()
            .filter(|(k, _)| k.deal_id == deal_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            guard.pop(&key);
        }
    }

    /// Number of entries currently cached, including any not yet expired
    /// but logically stale.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new()
    }
}
