//! C8 — the message pipeline.
//!
//! The only component in the engine that touches I/O. Everything else
//! (C1-C7, C9, C10) is a pure function; this module wires them together
//! against a `Store`, an `LLMClient`, a `Notifier`, and a `Reporter`,
//! one deal at a time.
//!
//! Two phases per incoming vendor message:
//!   1. parse + accumulate the offer, persist the vendor message at its
//!      "in progress" round. `deal.round` itself is NOT advanced yet.
//!   2. score utility, infer the behavioral signal, decide the round's
//!      action — `AskClarify` when the offer is still incomplete, or
//!      one of `Accept`/`Escalate`/`WalkAway`/`Counter` once it is —
//!      draft and persist the PM message, notify as needed, advance the
//!      deal's negotiation state, and only now set `deal.round` to the
//!      round just resolved.
//!
//! Per-deal work is serialized with an async mutex per
//! [`uuid::Uuid`] — grounded on the teacher's
//! `PodAIClient::connection_info: Arc<Mutex<ClientInfo>>` pattern for
//! guarding shared per-connection state, generalized here to one lock
//! per deal instead of one per client.

use crate::accumulator;
use crate::behavioral;
use crate::cache::{SuggestionCache, SuggestionKey};
use crate::capabilities::{LLMClient, Notifier, Reporter, Store};
use crate::decision_engine;
use crate::errors::{NegotiationError, NegotiationResult};
use crate::meso;
use crate::parser;
use crate::state as state_update;
use crate::state::RoundOutcome;
use crate::types::{
    Action, Decision, Deal, DealStatus, Message, MessageRole, MesoRound, VendorProfile,
};
use crate::utils::retry_with_backoff;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// How many times a transient Store/LLM failure is retried before the
/// round falls back to a degraded decision.
const MAX_DEPENDENCY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// What a round of the pipeline produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// A MESO round was presented and awaits the vendor's pick.
    MesoPresented(MesoRound),
    /// A decision was made and (where applicable) a message drafted.
    Decided(Decision),
}

/// Orchestrates one deal's negotiation against its capabilities.
/// Cheap to clone: everything it owns is an `Arc`.
pub struct NegotiationPipeline<S: Store, L: LLMClient, N: Notifier, R: Reporter> {
    store: Arc<S>,
    llm: Arc<L>,
    notifier: Arc<N>,
    reporter: Arc<R>,
    cache: Arc<SuggestionCache>,
    locks: DashMap<Uuid, Arc<AsyncMutex<()>>>,
}

impl<S, L, N, R> NegotiationPipeline<S, L, N, R>
where
    S: Store + 'static,
    L: LLMClient + 'static,
    N: Notifier + 'static,
    R: Reporter + 'static,
{
    /// Build a pipeline over the given capabilities, with a fresh
    /// suggestion cache.
    pub fn new(store: Arc<S>, llm: Arc<L>, notifier: Arc<N>, reporter: Arc<R>) -> Self {
        Self {
            store,
            llm,
            notifier,
            reporter,
            cache: Arc::new(SuggestionCache::new()),
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, deal_id: Uuid) -> Arc<AsyncMutex<()>> {
        self.locks
            .entry(deal_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Handle one incoming vendor message end to end.
    pub async fn receive_vendor_message(
        &self,
        deal_id: Uuid,
        content: String,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        let _span = tracing::info_span!("receive_vendor_message", %deal_id).entered();

        let lock = self.lock_for(deal_id);
        let _guard = lock.lock().await;

        let mut deal = self.load_deal(deal_id).await?;
        if deal.status != DealStatus::Negotiating {
            return Err(NegotiationError::conflict(
                "deal is not accepting vendor messages",
                format!("{:?}", deal.status),
            ));
        }

        let round = deal.round + 1;
        tracing::debug!(round, "parsed vendor offer");

        let message = Message::new(deal_id, MessageRole::Vendor, content.clone(), round, at);
        self.persist_message(&message).await?;

        let parsed = parser::parse_offer(&content);
        let prior = deal
            .latest_vendor_offer
            .clone()
            .unwrap_or_else(crate::types::AccumulatedOffer::empty);
        let accumulated = accumulator::accumulate(&prior, &parsed, message.id);

        deal.latest_vendor_offer = Some(accumulated);
        deal.last_message_at = Some(at);

        self.resolve_round(&mut deal, round, &content, at).await
    }

    /// Record the vendor's pick on an open MESO round and resolve the
    /// round it belongs to.
    pub async fn receive_meso_selection(
        &self,
        deal_id: Uuid,
        option_id: Uuid,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        let lock = self.lock_for(deal_id);
        let _guard = lock.lock().await;

        let mut deal = self.load_deal(deal_id).await?;
        let mut meso_round = self
            .store
            .get_open_meso_round(deal_id)
            .await?
            .ok_or_else(|| NegotiationError::not_found("MesoRound", deal_id.to_string()))?;

        if !meso_round.options.iter().any(|o| o.id == option_id) {
            return Err(NegotiationError::validation(
                "option_id",
                "not a member of the open MESO round",
            ));
        }
        meso_round.selected_option_id = Some(option_id);
        self.store.update_meso_round(&meso_round).await?;

        let selected_offer = meso_round
            .selected_option()
            .map(|o| o.offer.clone())
            .unwrap_or_default();

        let prior = deal
            .latest_vendor_offer
            .clone()
            .unwrap_or_else(crate::types::AccumulatedOffer::empty);
        let accumulated = accumulator::accumulate(&prior, &selected_offer, Uuid::new_v4());
        deal.latest_vendor_offer = Some(accumulated);
        deal.last_message_at = Some(at);

        let round = meso_round.round;
        self.resolve_round_with_meso(&mut deal, round, &meso_round, at).await
    }

    async fn resolve_round(
        &self,
        deal: &mut Deal,
        round: u32,
        vendor_text: &str,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        self.resolve_round_inner(deal, round, None, vendor_text, at).await
    }

    async fn resolve_round_with_meso(
        &self,
        deal: &mut Deal,
        round: u32,
        meso_round: &MesoRound,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        self.resolve_round_inner(deal, round, Some(meso_round), "", at).await
    }

    /// Phase 2: compute the round's decision and apply it. `deal.round`
    /// is only assigned `round` at the very end, once the PM message (or
    /// terminal transition) for this round is committed — spec.md's "do
    /// NOT advance deal.round yet" covers every round, not just
    /// incomplete-offer ones.
    async fn resolve_round_inner(
        &self,
        deal: &mut Deal,
        round: u32,
        resolved_meso: Option<&MesoRound>,
        vendor_text: &str,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        let accumulated = deal
            .latest_vendor_offer
            .clone()
            .ok_or_else(|| NegotiationError::internal("resolve_round called with no offer"))?;

        let utility = crate::utility::score_offer(&accumulated.offer, &deal.config);
        let adaptive_on = deal
            .config
            .adaptive_features
            .map(|f| f.enabled)
            .unwrap_or(false);
        let behavioral =
            adaptive_on.then(|| behavioral::infer_signal(&deal.state, &deal.config, round, vendor_text));
        let recent_price_delta =
            behavioral::recent_price_delta(&deal.state, accumulated.offer.total_price);

        let cache_key = SuggestionKey::new(deal.id, round, &accumulated.offer);
        let decision = if let Some(cached) = self.cache.get(&cache_key) {
            cached
        } else {
            let decision = decision_engine::decide(
                &accumulated.offer,
                accumulated.missing_fields(),
                utility,
                &deal.config,
                round,
                recent_price_delta,
                behavioral.clone(),
                deal.latest_counter.as_ref(),
            );
            self.cache.put(cache_key, decision.clone());
            decision
        };

        deal.latest_utility = Some(utility.total_utility);
        deal.latest_action = Some(decision.action.clone());

        let outcome = self.apply_action(deal, round, resolved_meso, &decision, at).await?;

        let round_outcome = RoundOutcome {
            round,
            vendor_offer: &accumulated.offer,
            pm_counter: deal.latest_counter.as_ref(),
            utility: utility.total_utility,
            resolved_meso,
        };
        deal.state = state_update::advance(&deal.state, &round_outcome);
        deal.round = round;

        self.persist_deal(deal).await?;
        Ok(outcome)
    }

    async fn apply_action(
        &self,
        deal: &mut Deal,
        round: u32,
        resolved_meso: Option<&MesoRound>,
        decision: &Decision,
        at: DateTime<Utc>,
    ) -> NegotiationResult<PipelineOutcome> {
        match &decision.action {
            Action::AskClarify { missing } => {
                let draft = ask_clarify_message(missing);
                let message = Message::new(deal.id, MessageRole::Buyer, draft, round, at);
                self.persist_message(&message).await?;
                Ok(PipelineOutcome::Decided(decision.clone()))
            }
            Action::Accept => {
                deal.transition_to(DealStatus::Accepted, at)?;
                self.cache.invalidate_deal(deal.id);
                self.spawn_notify_accepted(deal.clone());
                self.spawn_render_summary(deal.clone());
                self.spawn_update_vendor_profile(
                    deal.vendor_id,
                    decision.utility.price_utility,
                    round,
                );
                Ok(PipelineOutcome::Decided(decision.clone()))
            }
            Action::Escalate { reason } => {
                deal.transition_to(DealStatus::Escalated, at)?;
                self.spawn_notify_escalated(deal.clone(), reason.clone());
                Ok(PipelineOutcome::Decided(decision.clone()))
            }
            Action::WalkAway { reason } => {
                deal.transition_to(DealStatus::WalkedAway, at)?;
                self.cache.invalidate_deal(deal.id);
                self.spawn_notify_walked_away(deal.clone(), reason.clone());
                self.spawn_update_vendor_profile(
                    deal.vendor_id,
                    decision.utility.price_utility,
                    round,
                );
                Ok(PipelineOutcome::Decided(decision.clone()))
            }
            Action::Counter { offer } => {
                deal.latest_counter = Some(offer.clone());
                if let Some(meso_explain) = &decision.meso {
                    let generation_type =
                        meso::determine_generation_type(decision.utility.total_utility, resolved_meso);
                    let avoid_label = resolved_meso.and_then(|m| m.selected_option()).map(|o| o.label);
                    let meso_round = meso::generate(
                        deal.id,
                        round,
                        &deal.config,
                        meso_explain.target_utility,
                        generation_type,
                        avoid_label,
                        at,
                    );
                    self.store.create_meso_round(&meso_round).await?;
                    Ok(PipelineOutcome::MesoPresented(meso_round))
                } else {
                    let draft = self.draft_counter_message(deal, offer, at).await;
                    let message = Message::new(deal.id, MessageRole::Buyer, draft, round, at);
                    self.persist_message(&message).await?;
                    Ok(PipelineOutcome::Decided(decision.clone()))
                }
            }
        }
    }

    async fn draft_counter_message(
        &self,
        deal: &mut Deal,
        offer: &crate::types::Offer,
        _at: DateTime<Utc>,
    ) -> String {
        let prompt = format!(
            "Draft a brief, professional counter-offer for deal {}: price {:?}, terms {:?}.",
            deal.id, offer.total_price, offer.payment_terms
        );

        let llm = Arc::clone(&self.llm);
        let result = retry_with_backoff(MAX_DEPENDENCY_ATTEMPTS, RETRY_BASE_DELAY, || {
            let llm = Arc::clone(&llm);
            let prompt = prompt.clone();
            async move { llm.generate(&prompt).await }
        })
        .await;

        match result {
            Ok(text) => {
                deal.clear_degraded();
                text
            }
            Err(_) => {
                deal.mark_degraded();
                let reason = "LLM draft generation unavailable; used fallback template";
                self.spawn_notify_degraded(deal.clone(), reason.to_string());
                fallback_counter_text(offer)
            }
        }
    }

    /// Fire-and-forget: spawn `fut` and log a warning if it errors,
    /// without making the caller's request path wait on it. Mirrors
    /// §9's "async hooks, not synchronous calls" — the pipeline's
    /// response to the vendor never blocks on notification/reporting.
    fn spawn_hook<F>(&self, label: &'static str, fut: F)
    where
        F: std::future::Future<Output = NegotiationResult<()>> + Send + 'static,
    {
        tokio::spawn(async move {
            if let Err(error) = fut.await {
                tracing::warn!(hook = label, %error, "fire-and-forget hook failed");
            }
        });
    }

    fn spawn_notify_accepted(&self, deal: Deal) {
        let notifier = Arc::clone(&self.notifier);
        self.spawn_hook("notify_accepted", async move {
            notifier.notify_accepted(&deal).await.map(|_| ())
        });
    }

    fn spawn_notify_escalated(&self, deal: Deal, reason: String) {
        let notifier = Arc::clone(&self.notifier);
        self.spawn_hook("notify_escalated", async move {
            notifier.notify_escalated(&deal, &reason).await.map(|_| ())
        });
    }

    fn spawn_notify_walked_away(&self, deal: Deal, reason: String) {
        let notifier = Arc::clone(&self.notifier);
        self.spawn_hook("notify_walked_away", async move {
            notifier.notify_walked_away(&deal, &reason).await.map(|_| ())
        });
    }

    fn spawn_notify_degraded(&self, deal: Deal, reason: String) {
        let notifier = Arc::clone(&self.notifier);
        self.spawn_hook("notify_degraded", async move {
            notifier.notify_degraded(&deal, &reason).await.map(|_| ())
        });
    }

    fn spawn_render_summary(&self, deal: Deal) {
        let reporter = Arc::clone(&self.reporter);
        self.spawn_hook("render_summary", async move {
            reporter.render_summary(&deal).await.map(|_| ())
        });
    }

    /// Fold a concluded deal's outcome into the vendor's cross-deal
    /// profile. Read-modify-write against the store; fire-and-forget like
    /// the notification hooks above, since nothing on the request path
    /// depends on the updated profile being visible immediately.
    fn spawn_update_vendor_profile(&self, vendor_id: Uuid, price_concession: f64, rounds_to_settle: u32) {
        let store = Arc::clone(&self.store);
        self.spawn_hook("update_vendor_profile", async move {
            let mut profile = store
                .get_vendor_profile(vendor_id)
                .await?
                .unwrap_or_else(|| VendorProfile::new(vendor_id));
            profile.record_outcome(price_concession, rounds_to_settle);
            store.upsert_vendor_profile(&profile).await
        });
    }

    async fn load_deal(&self, deal_id: Uuid) -> NegotiationResult<Deal> {
        let store = Arc::clone(&self.store);
        retry_with_backoff(MAX_DEPENDENCY_ATTEMPTS, RETRY_BASE_DELAY, || {
            let store = Arc::clone(&store);
            async move { store.get_deal(deal_id).await }
        })
        .await
    }

    async fn persist_deal(&self, deal: &Deal) -> NegotiationResult<()> {
        let store = Arc::clone(&self.store);
        let deal = deal.clone();
        retry_with_backoff(MAX_DEPENDENCY_ATTEMPTS, RETRY_BASE_DELAY, move || {
            let store = Arc::clone(&store);
            let deal = deal.clone();
            async move { store.update_deal(&deal).await }
        })
        .await
    }

    async fn persist_message(&self, message: &Message) -> NegotiationResult<()> {
        let store = Arc::clone(&self.store);
        let message = message.clone();
        retry_with_backoff(MAX_DEPENDENCY_ATTEMPTS, RETRY_BASE_DELAY, move || {
            let store = Arc::clone(&store);
            let message = message.clone();
            async move { store.create_message(&message).await }
        })
        .await
    }
}

/// Deterministic, template-based counter text used when the LLM is
/// unavailable. Never as polished as a real draft, but keeps the round
/// moving instead of stalling the deal on a dependency outage.
fn fallback_counter_text(offer: &crate::types::Offer) -> String {
    let price = offer
        .total_price
        .map(|p| format!("${p:.2}"))
        .unwrap_or_else(|| "our prior price".to_string());
    let terms = offer
        .payment_terms
        .clone()
        .unwrap_or_else(|| "our prior terms".to_string());
    format!("We can offer {price} with {terms}. Please let us know if this works for you.")
}

/// Deterministic clarification request naming the fields still missing
/// from the vendor's accumulated offer.
fn ask_clarify_message(missing: &[crate::types::OfferField]) -> String {
    let fields = missing
        .iter()
        .map(|field| format!("{field:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Could you confirm the following before we can respond: {fields}?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::base_config;
    use crate::testing::mocks::{InMemoryStore, MockLLMClient, NullNotifier, NullReporter};
    use crate::types::{Deal, DealMode};

    fn pipeline() -> NegotiationPipeline<InMemoryStore, MockLLMClient, NullNotifier, NullReporter> {
        NegotiationPipeline::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(MockLLMClient::scripted("Here is our counter-offer.")),
            Arc::new(NullNotifier),
            Arc::new(NullReporter),
        )
    }

    async fn seeded_deal(pipeline: &NegotiationPipeline<InMemoryStore, MockLLMClient, NullNotifier, NullReporter>) -> Deal {
        let deal = Deal::new(
            "Test deal",
            DealMode::Conversation,
            base_config(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        );
        pipeline.store.update_deal(&deal).await.unwrap();
        deal
    }

    #[tokio::test]
    async fn test_incomplete_offer_asks_for_clarification() {
        let pipeline = pipeline();
        let deal = seeded_deal(&pipeline).await;
        let outcome = pipeline
            .receive_vendor_message(deal.id, "We can do $1000.".to_string(), Utc::now())
            .await
            .unwrap();
        match outcome {
            PipelineOutcome::Decided(decision) => {
                assert!(matches!(decision.action, Action::AskClarify { .. }));
            }
            other => panic!("expected Decided(AskClarify), got {other:?}"),
        }

        let reloaded = pipeline.store.get_deal(deal.id).await.unwrap();
        assert_eq!(reloaded.round, 1);
        let messages = pipeline.store.list_messages(deal.id).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_offer_produces_decision() {
        let pipeline = pipeline();
        let deal = seeded_deal(&pipeline).await;
        let outcome = pipeline
            .receive_vendor_message(
                deal.id,
                "We can do $1050 with Net60 terms.".to_string(),
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, PipelineOutcome::Decided(_)));
    }

    #[tokio::test]
    async fn test_rejects_message_on_non_negotiating_deal() {
        let pipeline = pipeline();
        let mut deal = seeded_deal(&pipeline).await;
        deal.transition_to(DealStatus::WalkedAway, Utc::now()).unwrap();
        pipeline.store.update_deal(&deal).await.unwrap();
        let result = pipeline
            .receive_vendor_message(deal.id, "$900, Net30".to_string(), Utc::now())
            .await;
        assert!(result.is_err());
    }
}
