//! `NegotiationConfig` — the PM's stance, in full.

use crate::errors::{NegotiationError, NegotiationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tolerance used when checking that weights sum to 1.0.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// The price parameter: minimize total order price.
///
/// `total_price` is the sum for the whole order. The legacy `unit_price`
/// notion from the source system is not represented here at all — configs
/// are built directly in terms of `total_price`, so there is no way to
/// construct a config that mixes the two.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceParameter {
    /// Relative importance of price in the overall utility score.
    pub weight: f64,
    /// The PM's ideal (best-for-buyer) price. Utility is 1.0 at or below
    /// this value.
    pub anchor: f64,
    /// The PM's goal price. Utility is below 1.0 past this point.
    pub target: f64,
    /// The worst price the PM will consider. Utility is 0.0 here and
    /// beyond.
    pub max_acceptable: f64,
    /// Nominal per-round concession magnitude for the PM's price counter.
    pub concession_step: f64,
}

impl PriceParameter {
    /// Basic shape check: anchor <= target <= max_acceptable.
    pub fn validate(&self) -> NegotiationResult<()> {
        if !(self.anchor <= self.target && self.target <= self.max_acceptable) {
            return Err(NegotiationError::validation(
                "total_price",
                "anchor must be <= target <= max_acceptable",
            ));
        }
        Ok(())
    }
}

/// The payment-terms parameter: a closed, ordered set of options with a
/// per-option utility lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermsParameter {
    /// Relative importance of payment terms in the overall utility score.
    pub weight: f64,
    /// Ordered set of acceptable terms, e.g. `["Net30", "Net60", "Net90"]`.
    pub options: Vec<String>,
    /// Utility in `[0, 1]` for each option. Options not present here (or
    /// not in `options`) evaluate to 0.
    pub utility_map: HashMap<String, f64>,
}

impl TermsParameter {
    /// Utility for a given payment-terms string, or 0 if unknown.
    pub fn utility_of(&self, terms: &str) -> f64 {
        self.utility_map.get(terms).copied().unwrap_or(0.0)
    }

    /// The option immediately "closer to the vendor" than `from`, used
    /// when the PM concedes one step on terms. Options are ordered from
    /// most PM-favorable to least.
    pub fn step_toward(&self, from: &str, vendor_terms: &str) -> Option<String> {
        let from_idx = self.options.iter().position(|o| o == from)?;
        let vendor_idx = self.options.iter().position(|o| o == vendor_terms);
        match vendor_idx {
            Some(v_idx) if v_idx > from_idx => self.options.get(from_idx + 1).cloned(),
            Some(v_idx) if v_idx < from_idx && from_idx > 0 => {
                self.options.get(from_idx - 1).cloned()
            }
            _ => Some(from.to_string()),
        }
    }
}

/// The (optional) delivery parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryParameter {
    /// Relative importance of delivery in the overall utility score.
    pub weight: f64,
    /// The date the PM would prefer delivery by. Utility 1.0 on or before.
    pub preferred_date: chrono::NaiveDate,
    /// The latest acceptable delivery date before lateness penalties
    /// begin.
    pub required_date: chrono::NaiveDate,
    /// Days past `required_date` after which utility reaches 0.
    pub max_late_days: i64,
}

/// Soft/hard round caps with auto-extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DynamicRounds {
    /// Preferred round ceiling; may be extended up to `hard_max`.
    pub soft_max: u32,
    /// Absolute round ceiling; never extended past this.
    pub hard_max: u32,
    /// Whether the engine is allowed to extend past `soft_max` at all.
    pub auto_extend_enabled: bool,
}

/// Toggles for the behavioral/adaptive strategy layer (C4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdaptiveFeatures {
    /// Whether behavioral signals and adaptive aggressiveness are
    /// computed at all for this deal.
    pub enabled: bool,
}

/// Negotiation priority, driving threshold/weight overlays in the config
/// builder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    /// Tighten thresholds; concede less.
    High,
    /// Default stance.
    Medium,
    /// Loosen thresholds; concede more readily.
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// The PM's full stance for a deal: weighted parameters, thresholds, and
/// round limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegotiationConfig {
    /// Price parameter (always present; price is always scored).
    pub total_price: PriceParameter,
    /// Payment-terms parameter (always present).
    pub payment_terms: TermsParameter,
    /// Delivery parameter, if delivery is part of this deal's scoring.
    pub delivery: Option<DeliveryParameter>,
    /// Utility at or above which an offer is accepted outright.
    pub accept_threshold: f64,
    /// Utility at or above which a timed-out deal escalates instead of
    /// walking away.
    pub escalate_threshold: f64,
    /// Utility below which the deal may walk away.
    pub walkaway_threshold: f64,
    /// Soft round ceiling (hard ceiling if `dynamic_rounds` is absent).
    pub max_rounds: u32,
    /// Negotiation priority.
    pub priority: Priority,
    /// Optional soft/hard round extension.
    pub dynamic_rounds: Option<DynamicRounds>,
    /// Optional behavioral/adaptive toggles.
    pub adaptive_features: Option<AdaptiveFeatures>,
}

impl NegotiationConfig {
    /// Validate every invariant spec.md §3/§8 requires of a config:
    /// threshold ordering, weight sum, and parameter shape. Called before
    /// any mutation that depends on the config.
    pub fn validate(&self) -> NegotiationResult<()> {
        if !(self.walkaway_threshold < self.escalate_threshold
            && self.escalate_threshold <= self.accept_threshold)
        {
            return Err(NegotiationError::validation(
                "thresholds",
                "require walkaway < escalate <= accept",
            ));
        }

        self.total_price.validate()?;

        let mut weight_sum = self.total_price.weight + self.payment_terms.weight;
        if let Some(delivery) = &self.delivery {
            weight_sum += delivery.weight;
        }
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(NegotiationError::validation(
                "weights",
                "parameter weights must sum to 1.0",
            ));
        }

        if self.payment_terms.options.is_empty() {
            return Err(NegotiationError::validation(
                "payment_terms.options",
                "must list at least one acceptable term",
            ));
        }

        if self.max_rounds == 0 {
            return Err(NegotiationError::validation(
                "max_rounds",
                "must be at least 1",
            ));
        }

        if let Some(dynamic) = &self.dynamic_rounds {
            if dynamic.hard_max < dynamic.soft_max {
                return Err(NegotiationError::validation(
                    "dynamic_rounds",
                    "hard_max must be >= soft_max",
                ));
            }
        }

        Ok(())
    }

    /// The effective round ceiling for this deal. Without `dynamic_rounds`,
    /// that's `max_rounds`. With it, the ceiling is `soft_max` unless
    /// `auto_extend_fired` is true and extension is enabled, in which case
    /// it's `hard_max` — the hard cap only applies once C4 has actually
    /// decided convergence warrants extending the round budget.
    pub fn hard_round_ceiling(&self, auto_extend_fired: bool) -> u32 {
        match &self.dynamic_rounds {
            Some(d) if auto_extend_fired && d.auto_extend_enabled => d.hard_max,
            Some(d) => d.soft_max,
            None => self.max_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> NegotiationConfig {
        let mut utility_map = HashMap::new();
        utility_map.insert("Net30".to_string(), 0.2);
        utility_map.insert("Net60".to_string(), 0.6);
        utility_map.insert("Net90".to_string(), 1.0);

        NegotiationConfig {
            total_price: PriceParameter {
                weight: 0.6,
                anchor: 850.0,
                target: 1000.0,
                max_acceptable: 1250.0,
                concession_step: 66.0,
            },
            payment_terms: TermsParameter {
                weight: 0.4,
                options: vec!["Net30".into(), "Net60".into(), "Net90".into()],
                utility_map,
            },
            delivery: None,
            accept_threshold: 0.70,
            escalate_threshold: 0.50,
            walkaway_threshold: 0.30,
            max_rounds: 6,
            priority: Priority::Medium,
            dynamic_rounds: None,
            adaptive_features: None,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_threshold_ordering_enforced() {
        let mut config = base_config();
        config.walkaway_threshold = 0.55;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weight_sum_enforced() {
        let mut config = base_config();
        config.total_price.weight = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_terms_utility_lookup_unknown_is_zero() {
        let config = base_config();
        assert_eq!(config.payment_terms.utility_of("Net120"), 0.0);
        assert_eq!(config.payment_terms.utility_of("Net90"), 1.0);
    }

    #[test]
    fn test_hard_round_ceiling_defaults_to_max_rounds() {
        let config = base_config();
        assert_eq!(config.hard_round_ceiling(false), 6);
        assert_eq!(config.hard_round_ceiling(true), 6);
    }

    #[test]
    fn test_hard_round_ceiling_uses_soft_max_until_extend_fires() {
        let mut config = base_config();
        config.dynamic_rounds = Some(DynamicRounds {
            soft_max: 6,
            hard_max: 9,
            auto_extend_enabled: true,
        });
        assert_eq!(config.hard_round_ceiling(false), 6);
    }

    #[test]
    fn test_hard_round_ceiling_uses_hard_max_once_extend_fires() {
        let mut config = base_config();
        config.dynamic_rounds = Some(DynamicRounds {
            soft_max: 6,
            hard_max: 9,
            auto_extend_enabled: true,
        });
        assert_eq!(config.hard_round_ceiling(true), 9);
    }

    #[test]
    fn test_hard_round_ceiling_ignores_extend_fired_when_disabled() {
        let mut config = base_config();
        config.dynamic_rounds = Some(DynamicRounds {
            soft_max: 6,
            hard_max: 9,
            auto_extend_enabled: false,
        });
        assert_eq!(config.hard_round_ceiling(true), 6);
    }
}
