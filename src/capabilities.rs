//! Capability traits the engine depends on but never implements:
//! persistence, LLM drafting, outbound notification, and reporting.
//! Grounded on the teacher's `PodAIClient` service-accessor pattern,
//! where each concern is its own narrow, mockable interface rather than
//! one god-object.

use crate::errors::NegotiationResult;
use crate::types::{Deal, Message, MesoRound, VendorProfile};
use async_trait::async_trait;
use uuid::Uuid;

/// Durable storage for deals, messages, MESO rounds, and vendor profiles.
/// The engine never assumes anything about the backing store beyond this
/// interface — no SQL, no schema, no transactions beyond what each method
/// documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a deal by id.
    async fn get_deal(&self, id: Uuid) -> NegotiationResult<Deal>;

    /// Persist a deal's full current state, overwriting whatever was
    /// stored before.
    async fn update_deal(&self, deal: &Deal) -> NegotiationResult<()>;

    /// Append a message to a deal's log.
    async fn create_message(&self, message: &Message) -> NegotiationResult<()>;

    /// List a deal's messages in the order they were created.
    async fn list_messages(&self, deal_id: Uuid) -> NegotiationResult<Vec<Message>>;

    /// The most recently created message for a deal, if any.
    async fn get_last_message(&self, deal_id: Uuid) -> NegotiationResult<Option<Message>>;

    /// Persist a new MESO round.
    async fn create_meso_round(&self, round: &MesoRound) -> NegotiationResult<()>;

    /// List a deal's MESO rounds in creation order.
    async fn list_meso_rounds(&self, deal_id: Uuid) -> NegotiationResult<Vec<MesoRound>>;

    /// The most recent unresolved MESO round for a deal, if any.
    async fn get_open_meso_round(&self, deal_id: Uuid) -> NegotiationResult<Option<MesoRound>>;

    /// Persist an updated (e.g. resolved) MESO round.
    async fn update_meso_round(&self, round: &MesoRound) -> NegotiationResult<()>;

    /// Insert or overwrite a vendor's cross-deal profile.
    async fn upsert_vendor_profile(&self, profile: &VendorProfile) -> NegotiationResult<()>;

    /// Fetch a vendor's profile, if one has been recorded.
    async fn get_vendor_profile(&self, vendor_id: Uuid) -> NegotiationResult<Option<VendorProfile>>;
}

/// Draft-generation capability: turns a structured offer/decision into
/// vendor-facing prose. The engine treats this purely as a black box
/// that can fail transiently (timeout, rate limit) or permanently (bad
/// prompt template) — it never inspects the model behind it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate vendor-facing message text from a prompt already
    /// assembled by the message pipeline.
    async fn generate(&self, prompt: &str) -> NegotiationResult<String>;
}

/// Outcome of a single notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The notification was accepted for delivery.
    Delivered,
    /// The notification could not be delivered but the deal should
    /// proceed anyway.
    Suppressed {
        /// Why delivery was suppressed.
        reason: String,
    },
}

/// Outbound notification capability: escalations, walkaways, and
/// acceptances all need a human told about them eventually.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify that a deal escalated to a human.
    async fn notify_escalated(&self, deal: &Deal, reason: &str) -> NegotiationResult<NotifyOutcome>;

    /// Notify that a deal was walked away from.
    async fn notify_walked_away(&self, deal: &Deal, reason: &str) -> NegotiationResult<NotifyOutcome>;

    /// Notify that a deal was accepted.
    async fn notify_accepted(&self, deal: &Deal) -> NegotiationResult<NotifyOutcome>;

    /// Notify that a deal is degraded and ran on a fallback decision.
    async fn notify_degraded(&self, deal: &Deal, reason: &str) -> NegotiationResult<NotifyOutcome>;
}

/// Reporting capability: renders a concluded deal into a standalone
/// artifact (e.g. a PDF or HTML summary) outside the engine's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Render a summary document for a concluded deal.
    async fn render_summary(&self, deal: &Deal) -> NegotiationResult<Vec<u8>>;
}
