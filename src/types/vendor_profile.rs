//! Cross-deal vendor behavioral memory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A coarse behavioral tag inferred for a vendor from past deals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BehaviorProfileTag {
    /// Concedes quickly, typically settles in few rounds.
    Cooperative,
    /// Holds firm, concedes slowly if at all.
    Hardline,
    /// No consistent pattern observed yet.
    Unclassified,
}

impl Default for BehaviorProfileTag {
    fn default() -> Self {
        Self::Unclassified
    }
}

/// Aggregated behavioral memory for one vendor, carried across deals and
/// used to seed C4's priors for a brand-new deal with that vendor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VendorProfile {
    /// The vendor this profile describes.
    pub vendor_id: Uuid,
    /// Deals completed with this vendor, used as the sample size behind
    /// `tag` and the averages below.
    pub deals_completed: u32,
    /// Mean fractional price concession observed across completed deals.
    pub avg_price_concession: f64,
    /// Mean number of rounds to settlement across completed deals.
    pub avg_rounds_to_settle: f64,
    /// Current coarse behavioral tag.
    pub tag: BehaviorProfileTag,
}

impl VendorProfile {
    /// A fresh, unclassified profile for a vendor with no history.
    pub fn new(vendor_id: Uuid) -> Self {
        Self {
            vendor_id,
            ..Default::default()
        }
    }

    /// Fold in the outcome of one completed deal, using a simple running
    /// mean (Bayesian-style shrinkage toward the prior happens in the
    /// behavioral component, not here; this struct only stores the raw
    /// aggregate).
    pub fn record_outcome(&mut self, price_concession: f64, rounds_to_settle: u32) {
        let n = self.deals_completed as f64;
        self.avg_price_concession = (self.avg_price_concession * n + price_concession) / (n + 1.0);
        self.avg_rounds_to_settle =
            (self.avg_rounds_to_settle * n + rounds_to_settle as f64) / (n + 1.0);
        self.deals_completed += 1;
        self.tag = if self.avg_rounds_to_settle <= 3.0 && self.avg_price_concession >= 0.1 {
            BehaviorProfileTag::Cooperative
        } else if self.deals_completed >= 2 {
            BehaviorProfileTag::Hardline
        } else {
            BehaviorProfileTag::Unclassified
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcome_updates_running_mean() {
        let mut profile = VendorProfile::new(Uuid::new_v4());
        profile.record_outcome(0.1, 4);
        profile.record_outcome(0.2, 2);
        assert_eq!(profile.deals_completed, 2);
        assert!((profile.avg_price_concession - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_cooperative_tag_assigned() {
        let mut profile = VendorProfile::new(Uuid::new_v4());
        profile.record_outcome(0.15, 2);
        assert_eq!(profile.tag, BehaviorProfileTag::Cooperative);
    }
}
