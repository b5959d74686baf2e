//! Offer and accumulated-offer types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A field of an [`Offer`], used wherever the engine needs to talk about
/// "which fields are present" without resorting to strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OfferField {
    /// Total price for the whole order.
    TotalPrice,
    /// Canonical payment terms (e.g. "Net30").
    PaymentTerms,
    /// Absolute delivery date.
    DeliveryDate,
    /// Delivery expressed as a day count.
    DeliveryDays,
    /// Advance payment percentage.
    AdvancePaymentPercent,
    /// Warranty period in months.
    WarrantyMonths,
}

/// A structured counterparty proposal. Any field may be absent; the offer
/// parser never fabricates a value for a field it could not extract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Offer {
    /// Total price for the whole order (never a per-unit price).
    pub total_price: Option<f64>,
    /// Canonical payment terms, e.g. `"Net30"`, `"Net0"`.
    pub payment_terms: Option<String>,
    /// Absolute delivery date, if the vendor named one.
    pub delivery_date: Option<NaiveDate>,
    /// Delivery expressed as a relative day count.
    pub delivery_days: Option<u32>,
    /// Advance payment percentage, e.g. `20.0` for "20% advance".
    pub advance_payment_percent: Option<f64>,
    /// Warranty period in months.
    pub warranty_months: Option<u32>,
}

impl Offer {
    /// An offer with no fields set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether both a price and payment terms are present — the minimum
    /// bar for a "complete" offer per the accumulator's policy.
    pub fn has_price_and_terms(&self) -> bool {
        self.total_price.is_some() && self.payment_terms.is_some()
    }

    /// Which of the canonical fields are present on this offer.
    pub fn provided_fields(&self) -> Vec<OfferField> {
        let mut fields = Vec::new();
        if self.total_price.is_some() {
            fields.push(OfferField::TotalPrice);
        }
        if self.payment_terms.is_some() {
            fields.push(OfferField::PaymentTerms);
        }
        if self.delivery_date.is_some() {
            fields.push(OfferField::DeliveryDate);
        }
        if self.delivery_days.is_some() {
            fields.push(OfferField::DeliveryDays);
        }
        if self.advance_payment_percent.is_some() {
            fields.push(OfferField::AdvancePaymentPercent);
        }
        if self.warranty_months.is_some() {
            fields.push(OfferField::WarrantyMonths);
        }
        fields
    }

    /// Merge `other` onto `self`, with `other`'s present fields winning.
    /// Absent fields in `other` never clear a present field in `self`.
    pub fn merged_with(&self, other: &Offer) -> Offer {
        Offer {
            total_price: other.total_price.or(self.total_price),
            payment_terms: other.payment_terms.clone().or_else(|| self.payment_terms.clone()),
            delivery_date: other.delivery_date.or(self.delivery_date),
            delivery_days: other.delivery_days.or(self.delivery_days),
            advance_payment_percent: other
                .advance_payment_percent
                .or(self.advance_payment_percent),
            warranty_months: other.warranty_months.or(self.warranty_months),
        }
    }
}

/// An [`Offer`] plus the bookkeeping the accumulator needs: completeness,
/// which fields came from where, and which messages contributed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccumulatedOffer {
    /// The merged offer.
    pub offer: Offer,
    /// Whether the offer has at least price and terms.
    pub is_complete: bool,
    /// Fields present on [`Self::offer`].
    pub provided_fields: Vec<OfferField>,
    /// Fields still missing (complement of `provided_fields`, minus
    /// delivery which is always optional for completeness purposes).
    pub missing_fields: Vec<OfferField>,
    /// Messages that contributed to this accumulation, oldest first.
    pub source_message_ids: Vec<Uuid>,
}

impl AccumulatedOffer {
    /// An empty accumulation with no source messages.
    pub fn empty() -> Self {
        Self {
            offer: Offer::empty(),
            is_complete: false,
            provided_fields: Vec::new(),
            missing_fields: vec![OfferField::TotalPrice, OfferField::PaymentTerms],
            source_message_ids: Vec::new(),
        }
    }

    /// Fields still required before the offer can be evaluated.
    pub fn missing_fields(&self) -> &[OfferField] {
        &self.missing_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_price_and_terms() {
        let mut offer = Offer::empty();
        assert!(!offer.has_price_and_terms());
        offer.total_price = Some(1000.0);
        assert!(!offer.has_price_and_terms());
        offer.payment_terms = Some("Net30".to_string());
        assert!(offer.has_price_and_terms());
    }

    #[test]
    fn test_merge_newer_wins() {
        let prior = Offer {
            total_price: Some(1000.0),
            payment_terms: Some("Net30".to_string()),
            ..Offer::empty()
        };
        let newer = Offer {
            total_price: Some(950.0),
            ..Offer::empty()
        };
        let merged = prior.merged_with(&newer);
        assert_eq!(merged.total_price, Some(950.0));
        assert_eq!(merged.payment_terms, Some("Net30".to_string()));
    }

    #[test]
    fn test_provided_fields() {
        let offer = Offer {
            total_price: Some(1000.0),
            delivery_days: Some(30),
            ..Offer::empty()
        };
        let fields = offer.provided_fields();
        assert!(fields.contains(&OfferField::TotalPrice));
        assert!(fields.contains(&OfferField::DeliveryDays));
        assert!(!fields.contains(&OfferField::PaymentTerms));
    }
}
