//! C6 — MESO (Multiple Equivalent Simultaneous Offers) generation.
//!
//! Builds a set of offers that all score at (approximately) the same PM
//! utility but trade off price, terms, and delivery differently, so the
//! vendor's pick reveals which parameter it actually values.

use crate::types::{
    DeliveryParameter, MesoGenerationType, MesoLabel, MesoOption, MesoRound, NegotiationConfig,
    Offer,
};
use crate::utility::score_offer;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Tolerance used when searching for a price/terms pair at the target
/// utility.
const UTILITY_SEARCH_TOLERANCE: f64 = 0.01;
const MAX_SEARCH_STEPS: u32 = 60;

/// Utility at or above which a MESO round tightens to close the deal.
pub const FINAL_UTILITY_TRIGGER: f64 = 0.75;

/// Default allowed deviation from `target_utility`.
pub const DEFAULT_VARIANCE: f64 = 0.05;

/// Allowed deviation for a `Final` round.
pub const FINAL_VARIANCE: f64 = 0.02;

/// How far a `Dynamic` round nudges the previously-selected axis away
/// from the target, so repeatedly picking it stops looking equivalent.
const DYNAMIC_PERTURBATION: f64 = 0.5 * DEFAULT_VARIANCE;

/// Which generation type applies to the next MESO round for this deal:
/// `Final` once utility clears [`FINAL_UTILITY_TRIGGER`], `Initial` for
/// the deal's first round, `Dynamic` otherwise.
pub fn determine_generation_type(current_utility: f64, previous: Option<&MesoRound>) -> MesoGenerationType {
    if current_utility >= FINAL_UTILITY_TRIGGER {
        MesoGenerationType::Final
    } else if previous.is_none() {
        MesoGenerationType::Initial
    } else {
        MesoGenerationType::Dynamic
    }
}

/// Generate a MESO round: a price-favoring, a terms-favoring, and a
/// balanced option, all at `target_utility`, plus a delivery-favoring
/// option when delivery is configured. `generation_type` controls the
/// variance band; for `Dynamic`, `avoid_label` (the previously-selected
/// axis) is nudged away from the target so the vendor isn't shown an
/// equivalent option again.
pub fn generate(
    deal_id: Uuid,
    round: u32,
    config: &NegotiationConfig,
    target_utility: f64,
    generation_type: MesoGenerationType,
    avoid_label: Option<MesoLabel>,
    created_at: DateTime<Utc>,
) -> MesoRound {
    let variance = match generation_type {
        MesoGenerationType::Final => FINAL_VARIANCE,
        _ => DEFAULT_VARIANCE,
    };

    let perturb = |label: MesoLabel| -> f64 {
        if generation_type == MesoGenerationType::Dynamic && avoid_label == Some(label) {
            (target_utility - DYNAMIC_PERTURBATION).clamp(0.0, 1.0)
        } else {
            target_utility
        }
    };

    let mut options = vec![
        make_option(
            price_favoring_option(config, perturb(MesoLabel::PriceFavoring)),
            MesoLabel::PriceFavoring,
            config,
        ),
        make_option(
            terms_favoring_option(config, perturb(MesoLabel::TermsFavoring)),
            MesoLabel::TermsFavoring,
            config,
        ),
        make_option(
            balanced_option(config, perturb(MesoLabel::Balanced)),
            MesoLabel::Balanced,
            config,
        ),
    ];

    if let Some(delivery) = &config.delivery {
        options.push(make_option(
            delivery_favoring_option(config, delivery, perturb(MesoLabel::DeliveryFavoring)),
            MesoLabel::DeliveryFavoring,
            config,
        ));
    }

    MesoRound {
        id: Uuid::new_v4(),
        deal_id,
        round,
        generation_type,
        options,
        target_utility,
        variance,
        selected_option_id: None,
        created_at,
    }
}

fn make_option(offer: Offer, label: MesoLabel, config: &NegotiationConfig) -> MesoOption {
    let utility = score_offer(&offer, config).total_utility;
    MesoOption {
        id: Uuid::new_v4(),
        offer,
        label,
        utility,
    }
}

/// Find the best price that, at the vendor's current (assumed most
/// favorable) terms, leaves the overall utility near `target_utility`,
/// then hold terms fixed — i.e. give the vendor the best terms the PM
/// offers, recovering utility via a tighter price.
fn price_favoring_option(config: &NegotiationConfig, target_utility: f64) -> Offer {
    let best_terms = config
        .payment_terms
        .options
        .iter()
        .max_by(|a, b| {
            config
                .payment_terms
                .utility_of(a)
                .total_cmp(&config.payment_terms.utility_of(b))
        })
        .cloned()
        .unwrap_or_default();
    let terms_utility = config.payment_terms.utility_of(&best_terms);

    let price = solve_price_for_target(config, target_utility, terms_utility);
    Offer {
        total_price: Some(price),
        payment_terms: Some(best_terms),
        ..Offer::empty()
    }
}

/// The mirror image: best price the PM offers, terms adjusted to land
/// on the target utility.
fn terms_favoring_option(config: &NegotiationConfig, target_utility: f64) -> Offer {
    let price = config.total_price.anchor;
    let price_utility_at_anchor = score_offer(
        &Offer {
            total_price: Some(price),
            ..Offer::empty()
        },
        config,
    )
    .price_utility;

    let terms = solve_terms_for_target(config, target_utility, price_utility_at_anchor);
    Offer {
        total_price: Some(price),
        payment_terms: Some(terms),
        ..Offer::empty()
    }
}

/// A roughly even split between price and terms concessions.
fn balanced_option(config: &NegotiationConfig, target_utility: f64) -> Offer {
    let midpoint_price = (config.total_price.anchor + config.total_price.target) / 2.0;
    let price_utility = score_offer(
        &Offer {
            total_price: Some(midpoint_price),
            ..Offer::empty()
        },
        config,
    )
    .price_utility;

    let terms = solve_terms_for_target(config, target_utility, price_utility);
    Offer {
        total_price: Some(midpoint_price),
        payment_terms: Some(terms),
        ..Offer::empty()
    }
}

/// Favor fast delivery at the cost of price/terms, holding delivery at
/// the PM's preferred date.
fn delivery_favoring_option(
    config: &NegotiationConfig,
    delivery: &DeliveryParameter,
    target_utility: f64,
) -> Offer {
    let base = balanced_option(config, target_utility);
    Offer {
        delivery_date: Some(delivery.preferred_date),
        ..base
    }
}

/// Binary-search a total price such that
/// `price_utility * price_weight + fixed_terms_utility * terms_weight`
/// lands near `target_utility`.
fn solve_price_for_target(config: &NegotiationConfig, target_utility: f64, terms_utility: f64) -> f64 {
    let needed_price_utility = ((target_utility - terms_utility * config.payment_terms.weight)
        / config.total_price.weight)
        .clamp(0.0, 1.0);

    let mut lo = config.total_price.anchor;
    let mut hi = config.total_price.max_acceptable;
    for _ in 0..MAX_SEARCH_STEPS {
        let mid = (lo + hi) / 2.0;
        let u = score_offer(
            &Offer {
                total_price: Some(mid),
                ..Offer::empty()
            },
            config,
        )
        .price_utility;
        if (u - needed_price_utility).abs() < UTILITY_SEARCH_TOLERANCE {
            return mid;
        }
        if u > needed_price_utility {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo + hi) / 2.0
}

/// Pick the terms option whose utility, combined with `price_utility`,
/// lands closest to `target_utility`.
fn solve_terms_for_target(config: &NegotiationConfig, target_utility: f64, price_utility: f64) -> String {
    config
        .payment_terms
        .options
        .iter()
        .min_by(|a, b| {
            let utility_a =
                price_utility * config.total_price.weight + config.payment_terms.utility_of(a) * config.payment_terms.weight;
            let utility_b =
                price_utility * config.total_price.weight + config.payment_terms.utility_of(b) * config.payment_terms.weight;
            (utility_a - target_utility)
                .abs()
                .total_cmp(&(utility_b - target_utility).abs())
        })
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::base_config;

    #[test]
    fn test_initial_round_has_three_options() {
        let config = base_config();
        let round = generate(
            Uuid::new_v4(),
            2,
            &config,
            0.6,
            MesoGenerationType::Initial,
            None,
            Utc::now(),
        );
        assert_eq!(round.options.len(), 3);
        assert_eq!(round.variance, DEFAULT_VARIANCE);
    }

    #[test]
    fn test_standard_options_near_target_utility() {
        let config = base_config();
        let target = 0.55;
        let round = generate(
            Uuid::new_v4(),
            2,
            &config,
            target,
            MesoGenerationType::Initial,
            None,
            Utc::now(),
        );
        for option in &round.options {
            assert!(
                (option.utility - target).abs() < 0.15,
                "option utility {} too far from target {}",
                option.utility,
                target
            );
        }
    }

    #[test]
    fn test_price_favoring_option_uses_best_terms() {
        let config = base_config();
        let option = price_favoring_option(&config, 0.6);
        assert_eq!(option.payment_terms, Some("Net90".to_string()));
    }

    #[test]
    fn test_round_adds_delivery_option_when_configured() {
        let mut config = base_config();
        config.delivery = Some(DeliveryParameter {
            weight: 0.2,
            preferred_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            required_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 15).unwrap(),
            max_late_days: 14,
        });
        config.total_price.weight = 0.5;
        config.payment_terms.weight = 0.3;
        let round = generate(
            Uuid::new_v4(),
            2,
            &config,
            0.6,
            MesoGenerationType::Initial,
            None,
            Utc::now(),
        );
        assert_eq!(round.options.len(), 4);
    }

    #[test]
    fn test_final_round_tightens_variance() {
        let config = base_config();
        let round = generate(
            Uuid::new_v4(),
            4,
            &config,
            0.8,
            MesoGenerationType::Final,
            None,
            Utc::now(),
        );
        assert_eq!(round.variance, FINAL_VARIANCE);
    }

    #[test]
    fn test_determine_generation_type_final_overrides_initial() {
        assert_eq!(
            determine_generation_type(0.8, None),
            MesoGenerationType::Final
        );
    }

    #[test]
    fn test_determine_generation_type_dynamic_when_previous_exists() {
        let config = base_config();
        let previous = generate(
            Uuid::new_v4(),
            2,
            &config,
            0.6,
            MesoGenerationType::Initial,
            None,
            Utc::now(),
        );
        assert_eq!(
            determine_generation_type(0.6, Some(&previous)),
            MesoGenerationType::Dynamic
        );
    }
}
