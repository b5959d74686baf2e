//! MESO (Multiple Equivalent Simultaneous Offers) types.

use super::offer::Offer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a MESO round's options were generated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MesoGenerationType {
    /// The first MESO round offered in a deal.
    Initial,
    /// A later round: perturbs away from the previously-selected
    /// option's neighborhood to widen the preference signal.
    Dynamic,
    /// Triggered once utility clears the closing threshold; tightens
    /// variance and aims to close the deal.
    Final,
}

/// Which axis a MESO option favors, for display/labeling purposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MesoLabel {
    /// Favors price over terms/delivery.
    PriceFavoring,
    /// Favors payment terms over price/delivery.
    TermsFavoring,
    /// Favors delivery over price/terms.
    DeliveryFavoring,
    /// Roughly balanced across all scored parameters.
    Balanced,
}

/// One equi-utility offer within a MESO round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MesoOption {
    /// Stable id, referenced by `MesoSelection` and by the pipeline when
    /// recording the vendor's pick.
    pub id: Uuid,
    /// The offer itself.
    pub offer: Offer,
    /// Which axis this option favors.
    pub label: MesoLabel,
    /// PM utility of this option — equal (within tolerance) across every
    /// option in a `Standard` round.
    pub utility: f64,
}

/// A full set of equi-utility options presented to the vendor in one
/// round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MesoRound {
    /// Stable id for this round.
    pub id: Uuid,
    /// The deal this round belongs to.
    pub deal_id: Uuid,
    /// The negotiation round number this MESO was offered in.
    pub round: u32,
    /// How the options were generated.
    pub generation_type: MesoGenerationType,
    /// The options offered, always >= 2.
    pub options: Vec<MesoOption>,
    /// Target utility every option in this round was generated at.
    pub target_utility: f64,
    /// Allowed deviation from `target_utility`: every option satisfies
    /// `|utility - target_utility| <= variance`. Tightened to `<= 0.02`
    /// for `Final` rounds.
    pub variance: f64,
    /// Which option the vendor picked, once known.
    pub selected_option_id: Option<Uuid>,
    /// When the round was generated.
    pub created_at: DateTime<Utc>,
}

impl MesoRound {
    /// The option the vendor selected, if recorded.
    pub fn selected_option(&self) -> Option<&MesoOption> {
        let id = self.selected_option_id?;
        self.options.iter().find(|o| o.id == id)
    }

    /// Whether the vendor picked the balanced option.
    pub fn selected_was_balanced(&self) -> bool {
        self.selected_option()
            .map(|o| o.label == MesoLabel::Balanced)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_round() -> MesoRound {
        MesoRound {
            id: Uuid::new_v4(),
            deal_id: Uuid::new_v4(),
            round: 2,
            generation_type: MesoGenerationType::Initial,
            options: vec![
                MesoOption {
                    id: Uuid::new_v4(),
                    offer: Offer::empty(),
                    label: MesoLabel::PriceFavoring,
                    utility: 0.6,
                },
                MesoOption {
                    id: Uuid::new_v4(),
                    offer: Offer::empty(),
                    label: MesoLabel::Balanced,
                    utility: 0.6,
                },
            ],
            target_utility: 0.6,
            variance: 0.05,
            selected_option_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_selected_was_balanced_false_before_selection() {
        let round = sample_round();
        assert!(!round.selected_was_balanced());
    }

    #[test]
    fn test_selected_was_balanced_true() {
        let mut round = sample_round();
        let balanced_id = round
            .options
            .iter()
            .find(|o| o.label == MesoLabel::Balanced)
            .unwrap()
            .id;
        round.selected_option_id = Some(balanced_id);
        assert!(round.selected_was_balanced());
    }
}
