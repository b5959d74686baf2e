//! C7 — negotiation state update.
//!
//! Folds one round's outcome (vendor offer, PM counter, utility, MESO
//! selection) into a deal's [`NegotiationState`]. Pure: given the prior
//! state and a round's facts, always produces the same next state.

use crate::types::{
    MesoRound, NegotiationState, Offer, ParameterKind, VendorEmphasis,
};

/// Inputs describing what happened in one completed round, used to
/// advance a deal's [`NegotiationState`].
pub struct RoundOutcome<'a> {
    /// The round number that just completed.
    pub round: u32,
    /// The vendor's offer for this round.
    pub vendor_offer: &'a Offer,
    /// The PM's counter-offer for this round, if one was made.
    pub pm_counter: Option<&'a Offer>,
    /// Utility of the vendor's offer this round.
    pub utility: f64,
    /// The MESO round resolved this round, if any.
    pub resolved_meso: Option<&'a MesoRound>,
}

/// Rounds a vendor must hold a balanced MESO pick for before the engine
/// treats the pattern as a real preference rather than noise.
const BALANCED_STREAK_FOR_EXPLORATION: u32 = 2;

/// Nominal length of a preference-exploration excursion, in rounds.
const EXPLORATION_LENGTH: u32 = 2;

/// Advance `state` with the facts of one completed round, returning the
/// updated state. Does not mutate `state` in place so callers can keep
/// the prior state around for logging/diffing.
pub fn advance(state: &NegotiationState, outcome: &RoundOutcome) -> NegotiationState {
    let mut next = state.clone();

    next.utility_history.push(outcome.utility);

    record_concession(
        &mut next.price_concessions,
        outcome.vendor_offer.total_price,
        last_price_offer(state),
    );
    record_terms_concession(&mut next, outcome);

    push_parameter_history(
        &mut next,
        ParameterKind::Price,
        outcome.vendor_offer.total_price.map(|p| format!("{p:.2}")),
    );
    push_parameter_history(
        &mut next,
        ParameterKind::Terms,
        outcome.vendor_offer.payment_terms.clone(),
    );

    if let Some(counter) = outcome.pm_counter {
        next.last_pm_counter = Some(counter.clone());
    }
    next.pm_price_history.push(outcome.pm_counter.and_then(|c| c.total_price));

    if let Some(meso) = outcome.resolved_meso {
        apply_meso_outcome(&mut next, meso, outcome.round);
    }

    if next.in_preference_exploration {
        next.exploration_rounds_remaining = next.exploration_rounds_remaining.saturating_sub(1);
        if next.exploration_rounds_remaining == 0 {
            next.in_preference_exploration = false;
        }
    }

    next
}

fn last_price_offer(state: &NegotiationState) -> Option<f64> {
    state
        .parameter_histories
        .iter()
        .find(|h| h.parameter == Some(ParameterKind::Price))
        .and_then(|h| h.values.last())
        .and_then(|v| v.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
}

fn record_concession(history: &mut Vec<f64>, new_price: Option<f64>, prior_price: Option<f64>) {
    if let (Some(new), Some(prior)) = (new_price, prior_price) {
        if prior > 0.0 {
            let fractional_move = ((prior - new) / prior).max(0.0);
            history.push(fractional_move);
        }
    }
}

fn record_terms_concession(next: &mut NegotiationState, outcome: &RoundOutcome) {
    // Terms concessions are recorded as a step count rather than a
    // fraction: moving one option toward the vendor counts as 1.0,
    // holding position counts as 0.0. The engine doesn't have a natural
    // numeric distance between arbitrary term strings.
    let moved = outcome
        .pm_counter
        .and_then(|c| c.payment_terms.as_ref())
        .zip(next.last_pm_counter.as_ref().and_then(|p| p.payment_terms.as_ref()))
        .map(|(new, old)| if new != old { 1.0 } else { 0.0 })
        .unwrap_or(0.0);
    next.terms_concessions.push(moved);
}

fn push_parameter_history(next: &mut NegotiationState, kind: ParameterKind, value: Option<String>) {
    next.history_for_mut(kind).push(value);
}

fn apply_meso_outcome(next: &mut NegotiationState, meso: &MesoRound, round: u32) {
    let Some(selection) = meso.selected_option() else {
        return;
    };

    next.meso_selections.push(crate::types::MesoSelection {
        round,
        generation_type: meso.generation_type,
        option_id: selection.id,
        was_balanced: meso.selected_was_balanced(),
    });

    if meso.selected_was_balanced() {
        next.consecutive_balanced_selections += 1;
    } else {
        next.consecutive_balanced_selections = 0;
        next.vendor_emphasis = emphasis_from_label(selection.label);
    }

    if next.consecutive_balanced_selections >= BALANCED_STREAK_FOR_EXPLORATION
        && !next.in_preference_exploration
    {
        next.in_preference_exploration = true;
        next.exploration_rounds_remaining = EXPLORATION_LENGTH;
    }
}

fn emphasis_from_label(label: crate::types::MesoLabel) -> VendorEmphasis {
    use crate::types::MesoLabel::*;
    match label {
        PriceFavoring => VendorEmphasis::Terms,
        TermsFavoring => VendorEmphasis::Price,
        DeliveryFavoring => VendorEmphasis::Delivery,
        Balanced => VendorEmphasis::Balanced,
    }
}
