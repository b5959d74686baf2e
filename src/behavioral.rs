//! C4 — behavioral and adaptive strategy inference.
//!
//! Reads a deal's [`NegotiationState`] and decides, each round, how
//! aggressively the PM should concede and which parameter the vendor
//! appears to value most. Disabled entirely when
//! `NegotiationConfig::adaptive_features` is absent or off — in that
//! case callers should use [`neutral_signal`] rather than calling
//! [`infer_signal`].

use crate::types::{
    AdaptiveStrategyLabel, BehavioralExplain, NegotiationConfig, NegotiationState, ParameterKind,
    Sentiment, VendorEmphasis,
};

/// Rounds of stable agreement required before a stall is declared.
pub const STALL_WINDOW: usize = 3;

/// EWMA smoothing factor for concession momentum.
const EWMA_ALPHA: f64 = 0.4;

/// `convergenceRate` above which the vendor is considered to be
/// converging toward the PM's position.
const CONVERGENCE_THETA: f64 = 0.05;

/// Momentum magnitude below which the vendor's pace is treated as flat
/// rather than accelerating or decelerating.
const MOMENTUM_THRESHOLD: f64 = 0.1;

/// The neutral signal used when adaptive features are off: no emphasis
/// inferred, nominal aggressiveness, no stall, no momentum.
pub fn neutral_signal() -> BehavioralExplain {
    BehavioralExplain {
        vendor_emphasis: VendorEmphasis::Balanced,
        emphasis_confidence: 0.0,
        aggressiveness_multiplier: 1.0,
        stall_detected: false,
        concession_velocity: 0.0,
        convergence_rate: 0.0,
        momentum: 0.0,
        is_converging: false,
        is_diverging: false,
        latest_sentiment: Sentiment::Neutral,
        strategy: AdaptiveStrategyLabel::MatchPace,
        should_extend_rounds: false,
    }
}

/// Infer this round's behavioral signal from the deal's accumulated
/// state, the config in force, the current round, and the vendor's
/// latest free text (for sentiment cues).
pub fn infer_signal(
    state: &NegotiationState,
    config: &NegotiationConfig,
    round: u32,
    latest_vendor_text: &str,
) -> BehavioralExplain {
    let (vendor_emphasis, emphasis_confidence) = infer_emphasis(state);
    let stall_detected = state
        .parameter_histories
        .iter()
        .any(|h| h.is_stalled(STALL_WINDOW));
    let concession_velocity = shrunk_mean(&state.price_concessions).unwrap_or(0.0);
    let convergence = convergence_rate(state);
    let vendor_momentum = momentum(&state.price_concessions);
    let is_converging = convergence > CONVERGENCE_THETA;
    let is_diverging = vendor_momentum < -MOMENTUM_THRESHOLD;
    let latest_sentiment = classify_sentiment(latest_vendor_text);
    let base_aggressiveness = aggressiveness(state, stall_detected);

    let (strategy, aggressiveness_multiplier, should_extend_rounds) = compute_adaptive_strategy(
        base_aggressiveness,
        vendor_momentum,
        is_converging,
        is_diverging,
        stall_detected,
        config,
        round,
    );

    BehavioralExplain {
        vendor_emphasis,
        emphasis_confidence,
        aggressiveness_multiplier,
        stall_detected,
        concession_velocity,
        convergence_rate: convergence,
        momentum: vendor_momentum,
        is_converging,
        is_diverging,
        latest_sentiment,
        strategy,
        should_extend_rounds,
    }
}

/// The simple one-round-back signal the decision engine's walkaway gate
/// uses: the prior round's vendor price minus this round's, or `None`
/// when there's no prior round yet (never satisfies the gate). Distinct
/// from the fuller [`convergence_rate`] used by the adaptive-strategy
/// layer — the walkaway gate needs "did the vendor move at all since
/// last round", not the whole-history closure rate.
pub fn recent_price_delta(state: &NegotiationState, current_price: Option<f64>) -> Option<f64> {
    let current = current_price?;
    let prior = state
        .history_for(ParameterKind::Price)?
        .values
        .last()?
        .as_ref()?
        .parse::<f64>()
        .ok()?;
    Some(prior - current)
}

/// `ComputeAdaptiveStrategy`: combines the momentum/convergence signals
/// into a strategy label, an adjusted aggressiveness multiplier, and
/// whether the round budget should extend past `dynamic_rounds.soft_max`
/// toward `hard_max`.
fn compute_adaptive_strategy(
    base_aggressiveness: f64,
    vendor_momentum: f64,
    is_converging: bool,
    is_diverging: bool,
    is_stalling: bool,
    config: &NegotiationConfig,
    round: u32,
) -> (AdaptiveStrategyLabel, f64, bool) {
    if is_stalling {
        return (AdaptiveStrategyLabel::HoldFirm, base_aggressiveness.max(1.3), false);
    }
    if is_diverging {
        return (
            AdaptiveStrategyLabel::SlowConcede,
            (base_aggressiveness * 0.7).clamp(0.5, 1.5),
            false,
        );
    }
    if is_converging {
        if should_extend_rounds(config, round) {
            return (AdaptiveStrategyLabel::Extend, base_aggressiveness, true);
        }
        return (
            AdaptiveStrategyLabel::FastConcede,
            (base_aggressiveness * 1.2).clamp(0.5, 1.5),
            false,
        );
    }
    let _ = vendor_momentum;
    (AdaptiveStrategyLabel::MatchPace, base_aggressiveness, false)
}

/// Whether the round budget should extend this round: only once the
/// deal has reached `soft_max`, extension is enabled, and the hard
/// ceiling hasn't already been reached.
fn should_extend_rounds(config: &NegotiationConfig, round: u32) -> bool {
    match &config.dynamic_rounds {
        Some(d) => d.auto_extend_enabled && round >= d.soft_max && round < d.hard_max,
        None => false,
    }
}

/// Mean fractional closure of the vendor−PM price gap, round over round:
/// for each pair of consecutive rounds with a recorded PM counter,
/// how much the `|vendor − pm|` gap shrank relative to the prior gap.
fn convergence_rate(state: &NegotiationState) -> f64 {
    let vendor_prices = price_series(state);
    let pm_prices = &state.pm_price_history;
    let mut closures = Vec::new();

    for i in 1..vendor_prices.len().min(pm_prices.len()) {
        let (Some(v_prev), Some(v_curr), Some(pm_prev), Some(pm_curr)) =
            (vendor_prices[i - 1], vendor_prices[i], pm_prices[i - 1], pm_prices[i])
        else {
            continue;
        };
        let gap_prev = (v_prev - pm_prev).abs();
        if gap_prev <= 0.0 {
            continue;
        }
        let gap_curr = (v_curr - pm_curr).abs();
        closures.push(((gap_prev - gap_curr) / gap_prev).clamp(-1.0, 1.0));
    }

    if closures.is_empty() {
        0.0
    } else {
        closures.iter().sum::<f64>() / closures.len() as f64
    }
}

/// The vendor's recorded price per round, oldest first, parsed back out
/// of the canonical string history.
fn price_series(state: &NegotiationState) -> Vec<Option<f64>> {
    state
        .history_for(ParameterKind::Price)
        .map(|h| {
            h.values
                .iter()
                .map(|v| v.as_ref().and_then(|s| s.parse::<f64>().ok()))
                .collect()
        })
        .unwrap_or_default()
}

/// Cheap keyword read on the vendor's latest message. Not a substitute
/// for real NLU — just enough to flag overt cooperation or resistance
/// for the explainability trail.
fn classify_sentiment(text: &str) -> Sentiment {
    const NEGATIVE_CUES: [&str; 5] = [
        "final offer",
        "can't go lower",
        "cannot go lower",
        "non-negotiable",
        "best we can do",
    ];
    const POSITIVE_CUES: [&str; 4] = ["happy to", "works for us", "glad to", "sounds good"];

    let lower = text.to_lowercase();
    if NEGATIVE_CUES.iter().any(|cue| lower.contains(cue)) {
        Sentiment::Negative
    } else if POSITIVE_CUES.iter().any(|cue| lower.contains(cue)) {
        Sentiment::Positive
    } else {
        Sentiment::Neutral
    }
}

/// Infer which parameter the vendor concedes on least, from the
/// recorded per-round concession fractions. Uses a simple
/// shrinkage-damped average so a single early round doesn't over-commit
/// the inference before enough data exists.
fn infer_emphasis(state: &NegotiationState) -> (VendorEmphasis, f64) {
    let price_avg = shrunk_mean(&state.price_concessions);
    let terms_avg = shrunk_mean(&state.terms_concessions);

    let (price_avg, terms_avg) = match (price_avg, terms_avg) {
        (Some(p), Some(t)) => (p, t),
        _ => return (VendorEmphasis::Balanced, 0.0),
    };

    let spread = (price_avg - terms_avg).abs();
    if spread < 0.02 {
        return (VendorEmphasis::Balanced, (spread * 10.0).min(0.3));
    }

    let emphasis = if price_avg < terms_avg {
        VendorEmphasis::Price
    } else {
        VendorEmphasis::Terms
    };
    let confidence = (spread * 3.0).min(1.0);
    (emphasis, confidence)
}

/// Bayesian-style shrinkage toward a neutral prior of 0.1 (10%
/// concession), weighted down when few samples exist.
fn shrunk_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let prior = 0.1;
    let prior_weight = 2.0;
    let n = values.len() as f64;
    let sample_sum: f64 = values.iter().sum();
    Some((sample_sum + prior * prior_weight) / (n + prior_weight))
}

/// EWMA momentum of the most recent concessions: positive means the
/// vendor is conceding faster than before, negative means slower.
fn momentum(values: &[f64]) -> f64 {
    let mut ewma = match values.first() {
        Some(v) => *v,
        None => return 0.0,
    };
    for &v in &values[1..] {
        ewma = EWMA_ALPHA * v + (1.0 - EWMA_ALPHA) * ewma;
    }
    let last = *values.last().unwrap();
    last - ewma
}

/// The PM's concession-step multiplier for this round: tightened when
/// the vendor is speeding up or the negotiation has stalled, loosened
/// when the vendor is decelerating.
fn aggressiveness(state: &NegotiationState, stall_detected: bool) -> f64 {
    if stall_detected {
        return 1.3;
    }
    let m = momentum(&state.price_concessions);
    (1.0 - m * 2.0).clamp(0.5, 1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::base_config;
    use crate::types::{DynamicRounds, ParameterHistory};

    #[test]
    fn test_neutral_signal_has_no_emphasis() {
        let signal = neutral_signal();
        assert_eq!(signal.vendor_emphasis, VendorEmphasis::Balanced);
        assert_eq!(signal.aggressiveness_multiplier, 1.0);
    }

    #[test]
    fn test_infer_emphasis_detects_price_stubbornness() {
        let mut state = NegotiationState::new();
        state.price_concessions = vec![0.01, 0.01, 0.01];
        state.terms_concessions = vec![0.3, 0.3, 0.3];
        let config = base_config();
        let signal = infer_signal(&state, &config, 3, "");
        assert_eq!(signal.vendor_emphasis, VendorEmphasis::Price);
    }

    #[test]
    fn test_infer_emphasis_balanced_when_no_data() {
        let state = NegotiationState::new();
        let config = base_config();
        let signal = infer_signal(&state, &config, 1, "");
        assert_eq!(signal.vendor_emphasis, VendorEmphasis::Balanced);
        assert_eq!(signal.emphasis_confidence, 0.0);
    }

    #[test]
    fn test_stall_detected_raises_aggressiveness() {
        let mut state = NegotiationState::new();
        let mut history = ParameterHistory::new(ParameterKind::Price);
        history.push(Some("1100".to_string()));
        history.push(Some("1100".to_string()));
        history.push(Some("1100".to_string()));
        state.parameter_histories.push(history);
        let config = base_config();
        let signal = infer_signal(&state, &config, 3, "");
        assert!(signal.stall_detected);
        assert_eq!(signal.aggressiveness_multiplier, 1.3);
        assert_eq!(signal.strategy, AdaptiveStrategyLabel::HoldFirm);
    }

    #[test]
    fn test_aggressiveness_clamped() {
        let mut state = NegotiationState::new();
        state.price_concessions = vec![0.0, 0.0, 0.9];
        let config = base_config();
        let signal = infer_signal(&state, &config, 3, "");
        assert!(signal.aggressiveness_multiplier >= 0.5);
        assert!(signal.aggressiveness_multiplier <= 1.5);
    }

    #[test]
    fn test_recent_price_delta_none_without_history() {
        let state = NegotiationState::new();
        assert_eq!(recent_price_delta(&state, Some(1400.0)), None);
    }

    #[test]
    fn test_recent_price_delta_zero_when_unchanged() {
        let mut state = NegotiationState::new();
        state
            .history_for_mut(ParameterKind::Price)
            .push(Some("1400.00".to_string()));
        assert_eq!(recent_price_delta(&state, Some(1400.0)), Some(0.0));
    }

    #[test]
    fn test_convergence_rate_positive_when_gap_shrinks() {
        let mut state = NegotiationState::new();
        state
            .history_for_mut(ParameterKind::Price)
            .push(Some("1200.00".to_string()));
        state
            .history_for_mut(ParameterKind::Price)
            .push(Some("1100.00".to_string()));
        state.pm_price_history = vec![Some(900.0), Some(950.0)];
        let config = base_config();
        let signal = infer_signal(&state, &config, 2, "");
        assert!(signal.convergence_rate > 0.0);
        assert!(signal.is_converging);
    }

    #[test]
    fn test_negative_sentiment_keyword_detected() {
        let state = NegotiationState::new();
        let config = base_config();
        let signal = infer_signal(&state, &config, 1, "This is our final offer.");
        assert_eq!(signal.latest_sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_should_extend_rounds_once_converging_past_soft_max() {
        let mut state = NegotiationState::new();
        state
            .history_for_mut(ParameterKind::Price)
            .push(Some("1200.00".to_string()));
        state
            .history_for_mut(ParameterKind::Price)
            .push(Some("1100.00".to_string()));
        state.pm_price_history = vec![Some(900.0), Some(950.0)];
        let mut config = base_config();
        config.dynamic_rounds = Some(DynamicRounds {
            soft_max: 2,
            hard_max: 5,
            auto_extend_enabled: true,
        });
        let signal = infer_signal(&state, &config, 2, "");
        assert!(signal.should_extend_rounds);
        assert_eq!(signal.strategy, AdaptiveStrategyLabel::Extend);
    }
}
