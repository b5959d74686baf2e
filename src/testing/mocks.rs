//! Hand-written test doubles, in the style of the teacher's
//! `testing::mock_services::MockPodAIClient`: an in-memory `Store` good
//! enough to drive the pipeline end to end, plus minimal stand-ins for
//! the other capabilities. For call-count/argument assertions, prefer
//! the `mockall`-generated `MockStore`/`MockLLMClient`/`MockNotifier`/
//! `MockReporter` from [`crate::capabilities`] instead.

use crate::capabilities::{LLMClient, Notifier, NotifyOutcome, Reporter, Store};
use crate::errors::{NegotiationError, NegotiationResult};
use crate::types::{Deal, Message, MesoRound, VendorProfile};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// A `Store` backed entirely by in-memory maps. Deterministic and
/// cheap, so pipeline tests never need a real database.
#[derive(Default)]
pub struct InMemoryStore {
    deals: DashMap<Uuid, Deal>,
    messages: DashMap<Uuid, Vec<Message>>,
    meso_rounds: DashMap<Uuid, Vec<MesoRound>>,
    vendor_profiles: DashMap<Uuid, VendorProfile>,
}

impl InMemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_deal(&self, id: Uuid) -> NegotiationResult<Deal> {
        self.deals
            .get(&id)
            .map(|d| d.clone())
            .ok_or_else(|| NegotiationError::not_found("Deal", id.to_string()))
    }

    async fn update_deal(&self, deal: &Deal) -> NegotiationResult<()> {
        self.deals.insert(deal.id, deal.clone());
        Ok(())
    }

    async fn create_message(&self, message: &Message) -> NegotiationResult<()> {
        self.messages.entry(message.deal_id).or_default().push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, deal_id: Uuid) -> NegotiationResult<Vec<Message>> {
        Ok(self.messages.get(&deal_id).map(|m| m.clone()).unwrap_or_default())
    }

    async fn get_last_message(&self, deal_id: Uuid) -> NegotiationResult<Option<Message>> {
        Ok(self.messages.get(&deal_id).and_then(|m| m.last().cloned()))
    }

    async fn create_meso_round(&self, round: &MesoRound) -> NegotiationResult<()> {
        self.meso_rounds.entry(round.deal_id).or_default().push(round.clone());
        Ok(())
    }

    async fn list_meso_rounds(&self, deal_id: Uuid) -> NegotiationResult<Vec<MesoRound>> {
        Ok(self.meso_rounds.get(&deal_id).map(|r| r.clone()).unwrap_or_default())
    }

    async fn get_open_meso_round(&self, deal_id: Uuid) -> NegotiationResult<Option<MesoRound>> {
        Ok(self
            .meso_rounds
            .get(&deal_id)
            .and_then(|rounds| rounds.iter().rev().find(|r| r.selected_option_id.is_none()).cloned()))
    }

    async fn update_meso_round(&self, round: &MesoRound) -> NegotiationResult<()> {
        if let Some(mut rounds) = self.meso_rounds.get_mut(&round.deal_id) {
            if let Some(existing) = rounds.iter_mut().find(|r| r.id == round.id) {
                *existing = round.clone();
            }
        }
        Ok(())
    }

    async fn upsert_vendor_profile(&self, profile: &VendorProfile) -> NegotiationResult<()> {
        self.vendor_profiles.insert(profile.vendor_id, profile.clone());
        Ok(())
    }

    async fn get_vendor_profile(&self, vendor_id: Uuid) -> NegotiationResult<Option<VendorProfile>> {
        Ok(self.vendor_profiles.get(&vendor_id).map(|p| p.clone()))
    }
}

/// An `LLMClient` that returns a fixed script, counting how many times
/// it was called.
pub struct MockLLMClient {
    script: String,
    calls: AtomicUsize,
    fail_next: std::sync::atomic::AtomicBool,
}

impl MockLLMClient {
    /// Always returns `text`.
    pub fn scripted(text: impl Into<String>) -> Self {
        Self {
            script: text.into(),
            calls: AtomicUsize::new(0),
            fail_next: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Number of times `generate` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next `generate` call return a transient error.
    pub fn fail_once(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> NegotiationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NegotiationError::dependency_transient("mock LLM failure"));
        }
        Ok(self.script.clone())
    }
}

/// A `Notifier` that accepts everything and records nothing.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_escalated(&self, _deal: &Deal, _reason: &str) -> NegotiationResult<NotifyOutcome> {
        Ok(NotifyOutcome::Delivered)
    }

    async fn notify_walked_away(&self, _deal: &Deal, _reason: &str) -> NegotiationResult<NotifyOutcome> {
        Ok(NotifyOutcome::Delivered)
    }

    async fn notify_accepted(&self, _deal: &Deal) -> NegotiationResult<NotifyOutcome> {
        Ok(NotifyOutcome::Delivered)
    }

    async fn notify_degraded(&self, _deal: &Deal, _reason: &str) -> NegotiationResult<NotifyOutcome> {
        Ok(NotifyOutcome::Delivered)
    }
}

/// A `Reporter` that renders nothing but a placeholder byte string.
pub struct NullReporter;

#[async_trait]
impl Reporter for NullReporter {
    async fn render_summary(&self, _deal: &Deal) -> NegotiationResult<Vec<u8>> {
        Ok(b"summary".to_vec())
    }
}
