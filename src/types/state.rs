//! Per-deal negotiation memory (`NegotiationState`) and its supporting types.

use super::meso::MesoGenerationType;
use super::offer::Offer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which parameter the vendor appears to be conceding on least — i.e. the
/// one it cares about most. The decision engine directs PM concessions
/// away from this parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VendorEmphasis {
    /// Vendor concedes least on price.
    Price,
    /// Vendor concedes least on payment terms.
    Terms,
    /// Vendor concedes least on delivery.
    Delivery,
    /// No parameter stands out.
    Balanced,
}

impl Default for VendorEmphasis {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Which scoring parameter a [`ParameterHistory`] tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Total price.
    Price,
    /// Payment terms.
    Terms,
    /// Delivery.
    Delivery,
}

/// Rolling per-round values for one parameter, used for stall detection
/// and concession-curve inference. Values are stored as their canonical
/// string form so identity comparison works uniformly across parameter
/// types (a price is compared as its formatted value, terms as the
/// canonical "NetN" string, delivery as an ISO date or day count).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterHistory {
    /// Which parameter this history tracks.
    pub parameter: Option<ParameterKind>,
    /// One entry per round the vendor stated a value for this parameter,
    /// oldest first. `None` marks a round where the vendor didn't state
    /// this parameter.
    pub values: Vec<Option<String>>,
}

impl ParameterHistory {
    /// Start an empty history for `parameter`.
    pub fn new(parameter: ParameterKind) -> Self {
        Self {
            parameter: Some(parameter),
            values: Vec::new(),
        }
    }

    /// Append a round's observed value (or `None` if the vendor didn't
    /// state this parameter that round).
    pub fn push(&mut self, value: Option<String>) {
        self.values.push(value);
    }

    /// Whether the last `window` rounds all carry the same `Some` value —
    /// the stall condition from spec.md §4.6.
    pub fn is_stalled(&self, window: usize) -> bool {
        if self.values.len() < window || window == 0 {
            return false;
        }
        let tail = &self.values[self.values.len() - window..];
        match &tail[0] {
            None => false,
            Some(first) => tail.iter().all(|v| v.as_ref() == Some(first)),
        }
    }
}

/// One round's MESO selection, used to detect repeated preference
/// patterns that trigger preference-exploration mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MesoSelection {
    /// The round the selection was made in.
    pub round: u32,
    /// Which MESO generation produced the options.
    pub generation_type: MesoGenerationType,
    /// The option the vendor picked.
    pub option_id: Uuid,
    /// Whether the picked option was the balanced one.
    pub was_balanced: bool,
}

/// A deal's full negotiation memory: concession history, inferred vendor
/// emphasis, MESO selection history, and per-parameter rolling values.
/// Rewritten in full by C7 on each Phase-2 completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NegotiationState {
    /// Per-round fractional price concessions, most recent last.
    pub price_concessions: Vec<f64>,
    /// Per-round fractional terms concessions, most recent last.
    pub terms_concessions: Vec<f64>,
    /// Inferred parameter the vendor cares about most.
    pub vendor_emphasis: VendorEmphasis,
    /// Confidence in `vendor_emphasis`, in `[0, 1]`.
    pub emphasis_confidence: f64,
    /// History of MESO selections across rounds.
    pub meso_selections: Vec<MesoSelection>,
    /// Consecutive rounds in which the vendor picked the balanced MESO
    /// option — drives entry into preference exploration.
    pub consecutive_balanced_selections: u32,
    /// The PM's last counter-offer, if any.
    pub last_pm_counter: Option<Offer>,
    /// The PM's counter price per round, oldest first, `None` for a round
    /// with no counter (e.g. an `ASK_CLARIFY` round). Paired with the
    /// vendor's price `ParameterHistory` to compute `convergenceRate`.
    pub pm_price_history: Vec<Option<f64>>,
    /// Utility score recorded at the end of each round, oldest first.
    pub utility_history: Vec<f64>,
    /// Rolling per-parameter histories, used for stall detection.
    pub parameter_histories: Vec<ParameterHistory>,
    /// Whether the deal is currently in preference-exploration mode.
    pub in_preference_exploration: bool,
    /// Rounds remaining in preference-exploration mode.
    pub exploration_rounds_remaining: u32,
}

impl NegotiationState {
    /// A fresh state for a brand-new deal.
    pub fn new() -> Self {
        Self {
            vendor_emphasis: VendorEmphasis::Balanced,
            emphasis_confidence: 0.0,
            ..Default::default()
        }
    }

    /// The parameter history for `kind`, if one has been recorded yet.
    pub fn history_for(&self, kind: ParameterKind) -> Option<&ParameterHistory> {
        self.parameter_histories
            .iter()
            .find(|h| h.parameter == Some(kind))
    }

    /// Mutable parameter history for `kind`, creating it if absent.
    pub fn history_for_mut(&mut self, kind: ParameterKind) -> &mut ParameterHistory {
        if let Some(idx) = self
            .parameter_histories
            .iter()
            .position(|h| h.parameter == Some(kind))
        {
            &mut self.parameter_histories[idx]
        } else {
            self.parameter_histories.push(ParameterHistory::new(kind));
            self.parameter_histories.last_mut().unwrap()
        }
    }
}
