//! Requisition and config-wizard input types — the raw material
//! [`crate::config_builder`] turns into a [`super::config::NegotiationConfig`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line item on a requisition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequisitionLineItem {
    /// Free-text description of what's being procured.
    pub description: String,
    /// Quantity requested.
    pub quantity: u32,
    /// Unit price the requisitioner expects, if known.
    pub expected_unit_price: Option<f64>,
}

/// The buyer-side request a deal is opened against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requisition {
    /// Stable id.
    pub id: Uuid,
    /// The user who raised the requisition.
    pub buyer_user_id: Uuid,
    /// Line items requested.
    pub line_items: Vec<RequisitionLineItem>,
    /// Total budget ceiling for the requisition, if set.
    pub budget_ceiling: Option<f64>,
    /// Date the requisitioner needs delivery by.
    pub needed_by: Option<NaiveDate>,
}

impl Requisition {
    /// Sum of `quantity * expected_unit_price` across line items that
    /// have a price, used as a starting anchor when a wizard input omits
    /// one explicitly.
    pub fn estimated_total(&self) -> Option<f64> {
        let mut total = 0.0;
        let mut any = false;
        for item in &self.line_items {
            if let Some(price) = item.expected_unit_price {
                total += price * item.quantity as f64;
                any = true;
            }
        }
        any.then_some(total)
    }
}

/// A sample of how a vendor concluded a past deal, used by the config
/// builder to propose informed defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorHistorySample {
    /// Final total price agreed.
    pub final_price: f64,
    /// Final payment terms agreed.
    pub final_terms: String,
    /// Rounds taken to settle.
    pub rounds_to_settle: u32,
}

/// Raw wizard input collected from a PM before a config is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WizardInput {
    /// The requisition this deal is for.
    pub requisition: Requisition,
    /// The PM's target price, overriding the requisition's estimate if
    /// set.
    pub target_price: Option<f64>,
    /// Acceptable payment terms options, most-favorable first.
    pub acceptable_terms: Vec<String>,
    /// Past outcomes with this vendor, if any, oldest first.
    pub vendor_history: Vec<VendorHistorySample>,
    /// Stated negotiation priority.
    pub priority: super::config::Priority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_total_sums_priced_items() {
        let req = Requisition {
            id: Uuid::new_v4(),
            buyer_user_id: Uuid::new_v4(),
            line_items: vec![
                RequisitionLineItem {
                    description: "widgets".into(),
                    quantity: 10,
                    expected_unit_price: Some(5.0),
                },
                RequisitionLineItem {
                    description: "gadgets".into(),
                    quantity: 2,
                    expected_unit_price: None,
                },
            ],
            budget_ceiling: None,
            needed_by: None,
        };
        assert_eq!(req.estimated_total(), Some(50.0));
    }

    #[test]
    fn test_estimated_total_none_when_no_prices() {
        let req = Requisition {
            id: Uuid::new_v4(),
            buyer_user_id: Uuid::new_v4(),
            line_items: vec![RequisitionLineItem {
                description: "widgets".into(),
                quantity: 10,
                expected_unit_price: None,
            }],
            budget_ceiling: None,
            needed_by: None,
        };
        assert_eq!(req.estimated_total(), None);
    }
}
