//! C5 — the decision engine.
//!
//! Turns a scored offer into one round's [`Decision`]: ask for
//! clarification, accept, escalate, walk away, or counter (optionally as
//! a MESO round). Pure function over its inputs; it never touches a
//! `Store` or clock itself, so its output is fully determined by what the
//! caller passes in.

use crate::types::{
    Action, BehavioralExplain, Decision, MesoExplain, NegotiationConfig, Offer, OfferField,
    Thresholds, UtilityBreakdown, VendorEmphasis,
};

/// Every `MESO_INTERVAL`th round, offer a MESO round instead of a single
/// counter when the engine still isn't confident about vendor emphasis.
const MESO_INTERVAL: u32 = 3;

/// Below this confidence, the engine treats vendor emphasis as unknown
/// and worth probing via MESO.
const MESO_CONFIDENCE_THRESHOLD: f64 = 0.35;

/// Decide the action for one round.
///
/// `offer` and `utility` describe the vendor's current accumulated offer;
/// `missing_fields` short-circuits to `ASK_CLARIFY` when non-empty.
/// `round` is the round this decision is for; `recent_price_delta` is
/// the prior round's vendor price minus this round's (`None` when there
/// is no prior round yet), used to gate walk-away on a stalled vendor
/// rather than a merely-low offer. `behavioral` is the adaptive signal
/// for the round, or `None` when adaptive features are disabled for the
/// deal — when present, its `should_extend_rounds` flag is what permits
/// `dynamic_rounds.hard_max` to apply. `last_pm_counter` is the PM's
/// previous counter-offer, used as the basis for this round's counter if
/// one is made.
pub fn decide(
    offer: &Offer,
    missing_fields: &[OfferField],
    utility: UtilityBreakdown,
    config: &NegotiationConfig,
    round: u32,
    recent_price_delta: Option<f64>,
    behavioral: Option<BehavioralExplain>,
    last_pm_counter: Option<&Offer>,
) -> Decision {
    let thresholds = Thresholds {
        accept_threshold: config.accept_threshold,
        escalate_threshold: config.escalate_threshold,
        walkaway_threshold: config.walkaway_threshold,
    };

    if !missing_fields.is_empty() {
        return Decision {
            action: Action::AskClarify {
                missing: missing_fields.to_vec(),
            },
            utility,
            thresholds,
            behavioral,
            meso: None,
            round,
        };
    }

    let auto_extend_fired = behavioral
        .as_ref()
        .map(|b| b.should_extend_rounds)
        .unwrap_or(false);
    let hard_ceiling = config.hard_round_ceiling(auto_extend_fired);

    let no_recent_convergence = recent_price_delta.map(|delta| delta <= 0.0).unwrap_or(false);

    let action = if utility.total_utility >= config.accept_threshold {
        Action::Accept
    } else if round >= hard_ceiling {
        if utility.total_utility >= config.escalate_threshold {
            Action::Escalate {
                reason: format!("round {round} reached hard ceiling {hard_ceiling}"),
            }
        } else {
            Action::WalkAway {
                reason: format!(
                    "round {round} reached hard ceiling {hard_ceiling} below escalate threshold"
                ),
            }
        }
    } else if utility.total_utility < config.walkaway_threshold && no_recent_convergence {
        Action::WalkAway {
            reason: format!(
                "utility {:.3} below walkaway threshold {:.3} with no vendor convergence over the last round",
                utility.total_utility, config.walkaway_threshold
            ),
        }
    } else {
        Action::Counter {
            offer: build_counter(offer, config, last_pm_counter, &behavioral),
        }
    };

    let meso = (matches!(action, Action::Counter { .. }) && should_offer_meso(round, &behavioral))
        .then(|| MesoExplain {
            reason:
                "vendor preference emphasis not yet confident; probing with equi-utility options"
                    .to_string(),
            target_utility: (config.accept_threshold + config.escalate_threshold) / 2.0,
        });

    Decision {
        action,
        utility,
        thresholds,
        behavioral,
        meso,
        round,
    }
}

fn should_offer_meso(round: u32, behavioral: &Option<BehavioralExplain>) -> bool {
    let Some(signal) = behavioral else {
        return false;
    };
    round > 0
        && round % MESO_INTERVAL == 0
        && signal.emphasis_confidence < MESO_CONFIDENCE_THRESHOLD
}

/// Build the PM's next counter-offer: step price and terms toward the
/// vendor, scaled by the behavioral aggressiveness multiplier, without
/// ever crossing the vendor's stated position or the PM's own ceiling.
fn build_counter(
    vendor_offer: &Offer,
    config: &NegotiationConfig,
    last_pm_counter: Option<&Offer>,
    behavioral: &Option<BehavioralExplain>,
) -> Offer {
    let multiplier = behavioral.as_ref().map(|b| b.aggressiveness_multiplier).unwrap_or(1.0);
    let base_price = last_pm_counter
        .and_then(|o| o.total_price)
        .unwrap_or(config.total_price.anchor);

    let total_price = vendor_offer.total_price.map(|vendor_price| {
        let step = config.total_price.concession_step * multiplier;
        let candidate = base_price + step;
        candidate.min(vendor_price).min(config.total_price.max_acceptable)
    });

    let base_terms = last_pm_counter
        .and_then(|o| o.payment_terms.clone())
        .or_else(|| config.payment_terms.options.first().cloned());

    let payment_terms = match (&base_terms, &vendor_offer.payment_terms) {
        (Some(base), Some(vendor_terms)) => config.payment_terms.step_toward(base, vendor_terms),
        (base, _) => base.clone(),
    };

    Offer {
        total_price,
        payment_terms,
        delivery_date: vendor_offer.delivery_date,
        delivery_days: vendor_offer.delivery_days,
        advance_payment_percent: vendor_offer.advance_payment_percent,
        warranty_months: vendor_offer.warranty_months,
    }
}
