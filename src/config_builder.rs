//! C10 — config builder.
//!
//! Turns a [`WizardInput`] (raw PM-facing form data plus any vendor
//! history) into a validated [`NegotiationConfig`], applying
//! priority-driven overlays and falling back to sensible defaults
//! wherever the wizard input under-specifies something.

use crate::errors::NegotiationResult;
use crate::types::{
    DynamicRounds, NegotiationConfig, PriceParameter, Priority, TermsParameter, VendorHistorySample,
    WizardInput,
};
use std::collections::HashMap;

/// Fraction below the target price used as the anchor when the wizard
/// doesn't supply vendor history to derive one from.
const DEFAULT_ANCHOR_DISCOUNT: f64 = 0.15;

/// Fraction above the target price used as the max-acceptable ceiling.
const DEFAULT_MAX_ACCEPTABLE_PREMIUM: f64 = 0.25;

/// Base thresholds before priority overlays are applied.
const BASE_ACCEPT_THRESHOLD: f64 = 0.70;
const BASE_ESCALATE_THRESHOLD: f64 = 0.50;
const BASE_WALKAWAY_THRESHOLD: f64 = 0.30;

/// Fallback target price when the wizard input and requisition both
/// under-specify one.
const DEFAULT_TARGET_PRICE: f64 = 1000.0;

/// Minimum vendor-history sample size before the historical-anchor shift
/// is applied at all.
const HISTORICAL_ANCHOR_MIN_SAMPLES: usize = 3;

/// Build and validate a [`NegotiationConfig`] from wizard input.
pub fn build_config(input: &WizardInput) -> NegotiationResult<NegotiationConfig> {
    let target_price = input
        .target_price
        .or_else(|| input.requisition.estimated_total())
        .unwrap_or(DEFAULT_TARGET_PRICE);

    let (anchor, max_acceptable) = price_bounds(target_price, &input.vendor_history);

    let total_price = PriceParameter {
        weight: 0.6,
        anchor,
        target: target_price,
        max_acceptable,
        concession_step: (max_acceptable - target_price) / 6.0,
    };

    let payment_terms = terms_parameter(&input.acceptable_terms);

    let (accept_threshold, escalate_threshold, walkaway_threshold) =
        priority_thresholds(input.priority);

    let max_rounds = match input.priority {
        Priority::High => 8,
        Priority::Medium => 6,
        Priority::Low => 5,
    };

    let config = NegotiationConfig {
        total_price,
        payment_terms,
        delivery: None,
        accept_threshold,
        escalate_threshold,
        walkaway_threshold,
        max_rounds,
        priority: input.priority,
        dynamic_rounds: Some(DynamicRounds {
            soft_max: max_rounds,
            hard_max: max_rounds + 3,
            auto_extend_enabled: true,
        }),
        adaptive_features: Some(crate::types::AdaptiveFeatures { enabled: true }),
    };

    config.validate()?;
    Ok(config)
}

/// Derive an anchor/max-acceptable pair around `target_price`. With at
/// least `HISTORICAL_ANCHOR_MIN_SAMPLES` vendor-history samples, the
/// anchor shifts toward `target_price` by
/// `min(10%·(target−anchor), 0.5·μ·target)`, where `μ` is the mean
/// final-discount this vendor historically conceded — a vendor that
/// reliably settles well below target earns a tighter (higher) anchor
/// next time.
fn price_bounds(target_price: f64, history: &[VendorHistorySample]) -> (f64, f64) {
    let default_anchor = target_price * (1.0 - DEFAULT_ANCHOR_DISCOUNT);
    let max_acceptable = target_price * (1.0 + DEFAULT_MAX_ACCEPTABLE_PREMIUM);

    if history.len() < HISTORICAL_ANCHOR_MIN_SAMPLES {
        return (default_anchor, max_acceptable);
    }

    let mean_discount = history
        .iter()
        .map(|h| (target_price - h.final_price) / target_price)
        .sum::<f64>()
        / history.len() as f64;

    let cap = 0.10 * (target_price - default_anchor);
    let shift = (0.5 * mean_discount * target_price).clamp(0.0, cap);
    (default_anchor + shift, max_acceptable)
}

fn terms_parameter(acceptable_terms: &[String]) -> TermsParameter {
    let options = if acceptable_terms.is_empty() {
        vec!["Net30".to_string(), "Net60".to_string(), "Net90".to_string()]
    } else {
        acceptable_terms.to_vec()
    };

    let mut utility_map = HashMap::new();
    let n = options.len().max(1);
    for (i, option) in options.iter().enumerate() {
        let utility = if n == 1 {
            1.0
        } else {
            i as f64 / (n as f64 - 1.0)
        };
        utility_map.insert(option.clone(), utility);
    }

    TermsParameter {
        weight: 0.4,
        options,
        utility_map,
    }
}

fn priority_thresholds(priority: Priority) -> (f64, f64, f64) {
    match priority {
        Priority::High => (
            BASE_ACCEPT_THRESHOLD + 0.05,
            BASE_ESCALATE_THRESHOLD + 0.05,
            BASE_WALKAWAY_THRESHOLD + 0.05,
        ),
        Priority::Medium => (
            BASE_ACCEPT_THRESHOLD,
            BASE_ESCALATE_THRESHOLD,
            BASE_WALKAWAY_THRESHOLD,
        ),
        Priority::Low => (
            BASE_ACCEPT_THRESHOLD - 0.05,
            BASE_ESCALATE_THRESHOLD - 0.05,
            BASE_WALKAWAY_THRESHOLD - 0.05,
        ),
    }
}
