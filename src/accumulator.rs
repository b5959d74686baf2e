//! C2 — offer accumulation across rounds.
//!
//! A vendor rarely states every field in one message. The accumulator
//! folds each newly-parsed [`Offer`] onto the running [`AccumulatedOffer`],
//! tracking which messages contributed and whether the result is
//! complete enough to evaluate.

use crate::types::{AccumulatedOffer, Offer, OfferField};
use uuid::Uuid;

/// Fold a newly parsed offer onto the running accumulation.
///
/// `prior` is the accumulation before this message; `new_offer` is what
/// [`crate::parser::parse_offer`] extracted from the latest vendor
/// message; `message_id` identifies the contributing message.
pub fn accumulate(prior: &AccumulatedOffer, new_offer: &Offer, message_id: Uuid) -> AccumulatedOffer {
    // A message that restates both price and terms is a fresh complete
    // offer, not an increment — prior partial fields (e.g. a stray
    // delivery_days from an earlier, unrelated message) don't carry
    // forward onto it.
    let merged = if new_offer.has_price_and_terms() {
        new_offer.clone()
    } else {
        prior.offer.merged_with(new_offer)
    };
    let provided_fields = merged.provided_fields();
    let missing_fields = missing_required_fields(&provided_fields);

    let mut source_message_ids = prior.source_message_ids.clone();
    if !new_offer.provided_fields().is_empty() {
        source_message_ids.push(message_id);
    }

    AccumulatedOffer {
        is_complete: merged.has_price_and_terms(),
        offer: merged,
        provided_fields,
        missing_fields,
        source_message_ids,
    }
}

fn missing_required_fields(provided: &[OfferField]) -> Vec<OfferField> {
    [OfferField::TotalPrice, OfferField::PaymentTerms]
        .into_iter()
        .filter(|f| !provided.contains(f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_combines_partial_offers() {
        let prior = AccumulatedOffer::empty();
        let first = Offer {
            total_price: Some(1000.0),
            ..Offer::empty()
        };
        let msg1 = Uuid::new_v4();
        let after_first = accumulate(&prior, &first, msg1);
        assert!(!after_first.is_complete);
        assert_eq!(after_first.missing_fields, vec![OfferField::PaymentTerms]);

        let second = Offer {
            payment_terms: Some("Net30".to_string()),
            ..Offer::empty()
        };
        let msg2 = Uuid::new_v4();
        let after_second = accumulate(&after_first, &second, msg2);
        assert!(after_second.is_complete);
        assert!(after_second.missing_fields.is_empty());
        assert_eq!(after_second.source_message_ids, vec![msg1, msg2]);
    }

    #[test]
    fn test_accumulate_newer_value_overrides_older() {
        let prior = AccumulatedOffer::empty();
        let first = Offer {
            total_price: Some(1000.0),
            payment_terms: Some("Net30".to_string()),
            ..Offer::empty()
        };
        let after_first = accumulate(&prior, &first, Uuid::new_v4());

        let revised = Offer {
            total_price: Some(950.0),
            ..Offer::empty()
        };
        let after_revision = accumulate(&after_first, &revised, Uuid::new_v4());
        assert_eq!(after_revision.offer.total_price, Some(950.0));
        assert_eq!(
            after_revision.offer.payment_terms,
            Some("Net30".to_string())
        );
    }

    #[test]
    fn test_accumulate_message_with_no_fields_not_recorded_as_source() {
        let prior = AccumulatedOffer::empty();
        let empty_msg = Offer::empty();
        let after = accumulate(&prior, &empty_msg, Uuid::new_v4());
        assert!(after.source_message_ids.is_empty());
    }

    #[test]
    fn test_fresh_complete_offer_discards_stray_prior_fields() {
        let prior = AccumulatedOffer::empty();
        let earlier = Offer {
            delivery_days: Some(14),
            ..Offer::empty()
        };
        let after_earlier = accumulate(&prior, &earlier, Uuid::new_v4());
        assert!(!after_earlier.is_complete);

        let complete = Offer {
            total_price: Some(950.0),
            payment_terms: Some("Net30".to_string()),
            ..Offer::empty()
        };
        let msg = Uuid::new_v4();
        let after_complete = accumulate(&after_earlier, &complete, msg);

        let from_fresh = accumulate(&AccumulatedOffer::empty(), &complete, msg);
        assert_eq!(after_complete.offer, from_fresh.offer);
        assert_eq!(after_complete.offer.delivery_days, None);
    }
}
