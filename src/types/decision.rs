//! Decision-engine output types: the action chosen for a round plus the
//! full explainability trail behind it.

use super::offer::{Offer, OfferField};
use super::state::VendorEmphasis;
use serde::{Deserialize, Serialize};

/// The action the decision engine selects for a round. Variants are
/// ordered by tie-break priority: when two actions are equally
/// supported, the earlier variant in this list wins (spec.md §4.5).
/// `AskClarify` is a prerequisite short-circuit rather than a genuine
/// competitor in the tie — an incomplete offer never reaches the point
/// where utility-based ties are evaluated — so it sits first by
/// convention rather than by a literal tie-break rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionKind {
    /// Ask the vendor to clarify a missing field.
    AskClarify,
    /// Accept the vendor's last offer outright.
    Accept,
    /// Escalate to a human for a decision.
    Escalate,
    /// Send a single counter-offer (optionally a MESO round).
    Counter,
    /// Walk away from the deal.
    WalkAway,
}

/// A chosen action together with its payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Action {
    /// The vendor's offer is missing required fields; no counter was
    /// generated.
    AskClarify {
        /// Fields still required before the offer can be evaluated.
        missing: Vec<OfferField>,
    },
    /// Accept the vendor's last offer outright.
    Accept,
    /// Escalate to a human for a decision.
    Escalate {
        /// Why this round escalated rather than continuing.
        reason: String,
    },
    /// Send a single counter-offer. When `meso` is set on the enclosing
    /// [`Decision`], this counter is a MESO round rather than a single
    /// bundle.
    Counter {
        /// The PM's counter-offer.
        offer: Offer,
    },
    /// Walk away from the deal.
    WalkAway {
        /// Why the deal is being abandoned.
        reason: String,
    },
}

impl Action {
    /// The tie-break-ordered kind of this action.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AskClarify { .. } => ActionKind::AskClarify,
            Self::Accept => ActionKind::Accept,
            Self::Escalate { .. } => ActionKind::Escalate,
            Self::Counter { .. } => ActionKind::Counter,
            Self::WalkAway { .. } => ActionKind::WalkAway,
        }
    }
}

/// Per-parameter utility contributions, for explainability and logging.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UtilityBreakdown {
    /// Raw utility in `[0, 1]` for price, before weighting.
    pub price_utility: f64,
    /// Raw utility in `[0, 1]` for payment terms, before weighting.
    pub terms_utility: f64,
    /// Raw utility in `[0, 1]` for delivery, before weighting, if scored.
    pub delivery_utility: Option<f64>,
    /// Final weighted-sum utility.
    pub total_utility: f64,
}

/// The thresholds in force when a decision was made, captured for
/// explainability independent of later config changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thresholds {
    /// Accept threshold at decision time.
    pub accept_threshold: f64,
    /// Escalate threshold at decision time.
    pub escalate_threshold: f64,
    /// Walkaway threshold at decision time.
    pub walkaway_threshold: f64,
}

/// Coarse read on the vendor's latest free text, from keyword cues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sentiment {
    /// Cooperative language ("happy to", "works for us").
    Positive,
    /// No strong cue either way.
    Neutral,
    /// Resistant language ("final offer", "can't go lower").
    Negative,
}

/// The adaptive-strategy label `ComputeAdaptiveStrategy` assigns for a
/// round, driving how the PM's aggressiveness is adjusted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdaptiveStrategyLabel {
    /// Concede at roughly the vendor's own pace.
    MatchPace,
    /// Concede more slowly than the vendor.
    SlowConcede,
    /// Concede faster to keep momentum.
    FastConcede,
    /// Hold the current position.
    HoldFirm,
    /// Convergence is real but slow; extend the round budget.
    Extend,
}

/// Behavioral-layer explanation, present only when adaptive features are
/// enabled for the deal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehavioralExplain {
    /// Inferred vendor emphasis at decision time.
    pub vendor_emphasis: VendorEmphasis,
    /// Confidence in that inference, in `[0, 1]`.
    pub emphasis_confidence: f64,
    /// Aggressiveness multiplier applied to the PM's concession step,
    /// where 1.0 is the nominal step.
    pub aggressiveness_multiplier: f64,
    /// Whether a stall was detected this round.
    pub stall_detected: bool,
    /// Mean fractional reduction vendor offer→offer.
    pub concession_velocity: f64,
    /// Mean fractional closure of the vendor−PM price gap per round.
    pub convergence_rate: f64,
    /// EWMA of signed concession rate, in `[-1, 1]`.
    pub momentum: f64,
    /// Whether `convergence_rate` clears the convergence threshold.
    pub is_converging: bool,
    /// Whether the vendor is moving away from the PM's position.
    pub is_diverging: bool,
    /// Keyword read on the vendor's latest message.
    pub latest_sentiment: Sentiment,
    /// The adaptive strategy chosen for this round.
    pub strategy: AdaptiveStrategyLabel,
    /// Whether this round's signals warrant extending the round budget
    /// up to `dynamic_rounds.hard_max`.
    pub should_extend_rounds: bool,
}

/// MESO-layer explanation, present only when a `Counter` decision's
/// counter is a MESO round rather than a single bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MesoExplain {
    /// Why a MESO round was chosen over a single counter.
    pub reason: String,
    /// Target utility the options were generated at.
    pub target_utility: f64,
}

/// The decision engine's full output for one round: the chosen action
/// plus everything needed to explain it later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    /// The chosen action.
    pub action: Action,
    /// Utility of the vendor's offer that prompted this decision.
    pub utility: UtilityBreakdown,
    /// Thresholds in force at decision time.
    pub thresholds: Thresholds,
    /// Behavioral explanation, if adaptive features were enabled.
    pub behavioral: Option<BehavioralExplain>,
    /// MESO explanation, if this round's `Counter` is a MESO round.
    pub meso: Option<MesoExplain>,
    /// The round this decision was made for.
    pub round: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_ordering() {
        assert!(ActionKind::AskClarify < ActionKind::Accept);
        assert!(ActionKind::Accept < ActionKind::Escalate);
        assert!(ActionKind::Escalate < ActionKind::Counter);
        assert!(ActionKind::Counter < ActionKind::WalkAway);
    }

    #[test]
    fn test_action_kind_mapping() {
        assert_eq!(Action::Accept.kind(), ActionKind::Accept);
        assert_eq!(
            Action::Counter {
                offer: Offer::empty()
            }
            .kind(),
            ActionKind::Counter
        );
    }
}
