//! The `Deal` aggregate: a negotiation's full persisted state.

use super::config::NegotiationConfig;
use super::decision::Action;
use super::offer::{AccumulatedOffer, Offer};
use super::state::NegotiationState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which capability a deal is using. `Insights` deals run utility scoring
/// and decision-making for display/advisory purposes only and never send
/// vendor-facing messages; `Conversation` deals run the full pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DealMode {
    /// Advisory-only: score and explain, never message the vendor.
    Insights,
    /// Full negotiation: score, decide, and message the vendor.
    Conversation,
}

/// A deal's lifecycle status.
///
/// Transitions are validated by [`DealStatus::can_transition_to`], mirroring
/// how a state machine guards against skipping or reversing terminal
/// states. `Escalated` is the one non-terminal state that can return to
/// `Negotiating` via [`Deal::resume`] rather than [`DealStatus::transition_to`],
/// since resuming is a distinct, explicitly human-triggered operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DealStatus {
    /// Actively exchanging offers.
    Negotiating,
    /// Settled; a final offer was accepted.
    Accepted,
    /// Abandoned; utility fell below the walkaway threshold.
    WalkedAway,
    /// Handed to a human for a decision.
    Escalated,
}

impl DealStatus {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: DealStatus) -> bool {
        use DealStatus::*;
        matches!(
            (self, next),
            (Negotiating, Accepted)
                | (Negotiating, WalkedAway)
                | (Negotiating, Escalated)
                | (Negotiating, Negotiating)
        )
    }

    /// Whether this status ends the deal's message pipeline activity.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::WalkedAway)
    }
}

impl Default for DealStatus {
    fn default() -> Self {
        Self::Negotiating
    }
}

/// A negotiation in progress (or concluded): its identity, configuration,
/// and full evaluative memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    /// Stable id.
    pub id: Uuid,
    /// Short human-readable title.
    pub title: String,
    /// Advisory or full-conversation mode.
    pub mode: DealMode,
    /// Current lifecycle status.
    pub status: DealStatus,
    /// Current negotiation round, starting at 0 before any vendor offer.
    pub round: u32,
    /// The PM's full stance for this deal.
    pub config: NegotiationConfig,
    /// Full negotiation memory (concessions, inferred emphasis, MESO
    /// history).
    pub state: NegotiationState,
    /// The user who owns this deal on the buyer side.
    pub buyer_user_id: Uuid,
    /// The counterparty vendor.
    pub vendor_id: Uuid,
    /// The requisition this deal was opened against.
    pub requisition_id: Uuid,
    /// The vendor's most recent accumulated offer, if any.
    pub latest_vendor_offer: Option<AccumulatedOffer>,
    /// The PM's most recent counter-offer, if any.
    pub latest_counter: Option<Offer>,
    /// Utility of the vendor's latest offer, if scored.
    pub latest_utility: Option<f64>,
    /// The last decision made for this deal, if any.
    pub latest_action: Option<Action>,
    /// Set when a dependency failure forced a fallback decision for a
    /// round; cleared on the next fully-healthy round.
    pub degraded: bool,
    /// When the deal was created.
    pub created_at: DateTime<Utc>,
    /// When the last message (either side) was recorded.
    pub last_message_at: Option<DateTime<Utc>>,
    /// When the deal reached a terminal status, if it has.
    pub concluded_at: Option<DateTime<Utc>>,
}

impl Deal {
    /// Construct a brand-new, round-0 deal in `Negotiating` status.
    pub fn new(
        title: impl Into<String>,
        mode: DealMode,
        config: NegotiationConfig,
        buyer_user_id: Uuid,
        vendor_id: Uuid,
        requisition_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            mode,
            status: DealStatus::Negotiating,
            round: 0,
            config,
            state: NegotiationState::new(),
            buyer_user_id,
            vendor_id,
            requisition_id,
            latest_vendor_offer: None,
            latest_counter: None,
            latest_utility: None,
            latest_action: None,
            degraded: false,
            created_at,
            last_message_at: None,
            concluded_at: None,
        }
    }

    /// Move the deal to `next`, or reject the transition without
    /// mutating anything.
    pub fn transition_to(
        &mut self,
        next: DealStatus,
        at: DateTime<Utc>,
    ) -> crate::errors::NegotiationResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(crate::errors::NegotiationError::conflict(
                format!("cannot move from {:?} to {:?}", self.status, next),
                format!("{:?}", self.status),
            ));
        }
        self.status = next;
        if next.is_terminal() {
            self.concluded_at = Some(at);
        }
        Ok(())
    }

    /// Bring an escalated deal back under the engine's control. This is
    /// the one exception to `can_transition_to`'s otherwise-terminal
    /// treatment of escalation: a human resolves the escalation and
    /// chooses to let the engine keep negotiating rather than decide the
    /// round itself.
    pub fn resume(&mut self) -> crate::errors::NegotiationResult<()> {
        if self.status != DealStatus::Escalated {
            return Err(crate::errors::NegotiationError::conflict(
                "resume is only valid from Escalated",
                format!("{:?}", self.status),
            ));
        }
        self.status = DealStatus::Negotiating;
        Ok(())
    }

    /// Mark the deal degraded: a dependency failed and the round's
    /// decision used a conservative fallback rather than the full
    /// pipeline.
    pub fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    /// Clear the degraded marker after a fully-healthy round.
    pub fn clear_degraded(&mut self) {
        self.degraded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deal() -> Deal {
        Deal::new(
            "Widget supply",
            DealMode::Conversation,
            crate::testing::fixtures::base_config(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_deal_starts_negotiating_round_zero() {
        let deal = sample_deal();
        assert_eq!(deal.status, DealStatus::Negotiating);
        assert_eq!(deal.round, 0);
    }

    #[test]
    fn test_transition_to_accepted_sets_concluded_at() {
        let mut deal = sample_deal();
        let at = Utc::now();
        deal.transition_to(DealStatus::Accepted, at).unwrap();
        assert_eq!(deal.status, DealStatus::Accepted);
        assert_eq!(deal.concluded_at, Some(at));
    }

    #[test]
    fn test_transition_from_terminal_rejected() {
        let mut deal = sample_deal();
        deal.transition_to(DealStatus::Accepted, Utc::now()).unwrap();
        assert!(deal.transition_to(DealStatus::WalkedAway, Utc::now()).is_err());
    }

    #[test]
    fn test_resume_only_valid_from_escalated() {
        let mut deal = sample_deal();
        assert!(deal.resume().is_err());
        deal.transition_to(DealStatus::Escalated, Utc::now()).unwrap();
        assert!(deal.resume().is_ok());
        assert_eq!(deal.status, DealStatus::Negotiating);
    }

    #[test]
    fn test_degraded_marker() {
        let mut deal = sample_deal();
        assert!(!deal.degraded);
        deal.mark_degraded();
        assert!(deal.degraded);
        deal.clear_degraded();
        assert!(!deal.degraded);
    }
}
