//! C3 — multi-attribute utility scoring.
//!
//! Scores an [`Offer`] against a [`NegotiationConfig`] on a `[0, 1]` scale
//! per parameter, then combines them with the config's weights into a
//! single weighted utility. Pure function, no side effects: the same
//! offer and config always score the same.

use crate::types::{NegotiationConfig, Offer, UtilityBreakdown};
use chrono::NaiveDate;

/// Linear utility for price: 1.0 at or below `anchor`, 0.0 at or above
/// `max_acceptable`, straight-line in between.
fn price_utility(config: &crate::types::PriceParameter, price: f64) -> f64 {
    let span = config.max_acceptable - config.anchor;
    if span <= 0.0 {
        return if price <= config.anchor { 1.0 } else { 0.0 };
    }
    ((config.max_acceptable - price) / span).clamp(0.0, 1.0)
}

/// Piecewise-linear utility for delivery: 1.0 at or before
/// `preferred_date`, decaying to 0 by `max_late_days` past
/// `required_date`.
fn delivery_utility(config: &crate::types::DeliveryParameter, date: NaiveDate) -> f64 {
    if date <= config.preferred_date {
        return 1.0;
    }
    let days_past_required = (date - config.required_date).num_days();
    if days_past_required <= 0 {
        let span = (config.required_date - config.preferred_date).num_days().max(1);
        let elapsed = (date - config.preferred_date).num_days();
        1.0 - 0.5 * (elapsed as f64 / span as f64)
    } else if days_past_required >= config.max_late_days {
        0.0
    } else {
        0.5 - 0.5 * (days_past_required as f64 / config.max_late_days.max(1) as f64)
    }
}

/// Score `offer` against `config`, returning both the weighted total and
/// the per-parameter breakdown. Missing fields on `offer` score 0 for
/// that parameter — an incomplete offer can never out-score a complete
/// one with the same stated values.
pub fn score_offer(offer: &Offer, config: &NegotiationConfig) -> UtilityBreakdown {
    let price = offer
        .total_price
        .map(|p| price_utility(&config.total_price, p))
        .unwrap_or(0.0);

    let terms = offer
        .payment_terms
        .as_deref()
        .map(|t| config.payment_terms.utility_of(t))
        .unwrap_or(0.0);

    let delivery = config.delivery.as_ref().map(|delivery_param| {
        offer
            .delivery_date
            .map(|d| delivery_utility(delivery_param, d))
            .unwrap_or(0.0)
    });

    let mut total = price * config.total_price.weight + terms * config.payment_terms.weight;
    if let (Some(delivery_utility), Some(delivery_param)) = (delivery, &config.delivery) {
        total += delivery_utility * delivery_param.weight;
    }

    UtilityBreakdown {
        price_utility: price,
        terms_utility: terms,
        delivery_utility: delivery,
        total_utility: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::base_config;

    #[test]
    fn test_price_at_anchor_scores_full_utility() {
        let config = base_config();
        let offer = Offer {
            total_price: Some(850.0),
            payment_terms: Some("Net90".to_string()),
            ..Offer::empty()
        };
        let score = score_offer(&offer, &config);
        assert!((score.price_utility - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_at_max_acceptable_scores_zero() {
        let config = base_config();
        let offer = Offer {
            total_price: Some(1250.0),
            ..Offer::empty()
        };
        let score = score_offer(&offer, &config);
        assert!(score.price_utility.abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_scores_zero() {
        let config = base_config();
        let offer = Offer {
            payment_terms: Some("Net90".to_string()),
            ..Offer::empty()
        };
        let score = score_offer(&offer, &config);
        assert_eq!(score.price_utility, 0.0);
    }

    #[test]
    fn test_weighted_total_matches_manual_calculation() {
        let config = base_config();
        let offer = Offer {
            total_price: Some(1000.0),
            payment_terms: Some("Net60".to_string()),
            ..Offer::empty()
        };
        let score = score_offer(&offer, &config);
        let expected = score.price_utility * 0.6 + score.terms_utility * 0.4;
        assert!((score.total_utility - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_score_zero() {
        let config = base_config();
        let offer = Offer {
            total_price: Some(900.0),
            payment_terms: Some("Net120".to_string()),
            ..Offer::empty()
        };
        let score = score_offer(&offer, &config);
        assert_eq!(score.terms_utility, 0.0);
    }
}
