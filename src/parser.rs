//! C1 — free-text offer parsing.
//!
//! Extracts a structured [`Offer`] from a vendor's free-text message.
//! Every extraction is conservative: if a pattern doesn't clearly match,
//! the field is left `None` rather than guessed at. Parsing is pure and
//! synchronous — no I/O, no LLM call — so accumulation (C2) can run it
//! against every incoming message without caring what backs the engine.

use crate::types::Offer;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// A recognized currency. Detected from a leading symbol or trailing
/// ISO code; defaults to `Usd` when a price has neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrencyCode {
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
    /// British pound.
    Gbp,
    /// Australian dollar.
    Aud,
}

impl CurrencyCode {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "$" => Some(Self::Usd),
            "A$" | "a$" => Some(Self::Aud),
            "€" => Some(Self::Eur),
            "£" => Some(Self::Gbp),
            _ => None,
        }
    }
}

/// Conversion rates between currency pairs, supplied by the caller — the
/// parser never fetches live rates itself. A missing pair leaves the
/// price unconverted (in its original currency).
pub type ConversionTable = HashMap<(CurrencyCode, CurrencyCode), f64>;

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(A\$|\$|€|£)\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)|([0-9][0-9,]*(?:\.[0-9]{1,2})?)\s*(?:usd|dollars)")
        .unwrap()
});

static TERMS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)net\s*-?\s*(\d{1,3})").unwrap());

static ADVANCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s*(?:advance|upfront|deposit)").unwrap());

static WARRANTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,3})\s*(?:-|\s)?month[s]?\s*warranty").unwrap());

static DELIVERY_DAYS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:deliver(?:y|ed)?|ship(?:ped)?)\s*(?:in|within)\s*(\d{1,4})\s*days?")
        .unwrap()
});

static DELIVERY_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap());

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Parse a single free-text vendor message into an [`Offer`]. Fields the
/// message doesn't clearly state are left `None`. Any currency symbol
/// is stripped but not converted — use [`parse_offer_with_currency`]
/// when the price needs normalizing to a common currency.
pub fn parse_offer(text: &str) -> Offer {
    let mut offer = Offer::empty();

    if let Some(caps) = PRICE_RE.captures(text) {
        let raw = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());
        offer.total_price = raw.and_then(parse_amount);
    }

    if let Some(caps) = TERMS_RE.captures(text) {
        if let Some(days) = caps.get(1) {
            offer.payment_terms = Some(format!("Net{}", days.as_str()));
        }
    }

    if let Some(caps) = ADVANCE_RE.captures(text) {
        if let Some(pct) = caps.get(1) {
            offer.advance_payment_percent = pct.as_str().parse::<f64>().ok();
        }
    }

    if let Some(caps) = WARRANTY_RE.captures(text) {
        if let Some(months) = caps.get(1) {
            offer.warranty_months = months.as_str().parse::<u32>().ok();
        }
    }

    if let Some(caps) = DELIVERY_DATE_RE.captures(text) {
        let y = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        let mo = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        let d = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
        if let (Some(y), Some(mo), Some(d)) = (y, mo, d) {
            offer.delivery_date = NaiveDate::from_ymd_opt(y, mo, d);
        }
    } else if let Some(caps) = DELIVERY_DAYS_RE.captures(text) {
        if let Some(days) = caps.get(1) {
            offer.delivery_days = days.as_str().parse::<u32>().ok();
        }
    }

    offer
}

/// The currency a parsed price was stated in, or `None` if no symbol
/// was present (callers typically treat this as the deal's home
/// currency).
pub fn detect_currency(text: &str) -> Option<CurrencyCode> {
    let caps = PRICE_RE.captures(text)?;
    let symbol = caps.get(1)?.as_str();
    CurrencyCode::from_symbol(symbol)
}

/// Parse `text` like [`parse_offer`], then convert a detected price into
/// `target` using `rates`. If no rate is on file for the detected pair,
/// the price is left in its original currency rather than guessed at.
pub fn parse_offer_with_currency(
    text: &str,
    target: CurrencyCode,
    rates: &ConversionTable,
) -> Offer {
    let mut offer = parse_offer(text);
    if let (Some(price), Some(from)) = (offer.total_price, detect_currency(text)) {
        if from != target {
            if let Some(rate) = rates.get(&(from, target)) {
                offer.total_price = Some(price * rate);
            }
        }
    }
    offer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_price_with_dollar_sign() {
        let offer = parse_offer("We can do $1,150.00 for the full order.");
        assert_eq!(offer.total_price, Some(1150.0));
    }

    #[test]
    fn test_parses_price_with_usd_suffix() {
        let offer = parse_offer("Our offer is 980 USD total.");
        assert_eq!(offer.total_price, Some(980.0));
    }

    #[test]
    fn test_parses_net_terms() {
        let offer = parse_offer("We'd need Net 45 on this one.");
        assert_eq!(offer.payment_terms, Some("Net45".to_string()));
    }

    #[test]
    fn test_parses_delivery_days() {
        let offer = parse_offer("Can deliver within 21 days of PO.");
        assert_eq!(offer.delivery_days, Some(21));
    }

    #[test]
    fn test_parses_delivery_date_over_days() {
        let offer = parse_offer("Delivery by 2026-09-01, roughly 30 days out.");
        assert_eq!(
            offer.delivery_date,
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert_eq!(offer.delivery_days, None);
    }

    #[test]
    fn test_parses_advance_percent() {
        let offer = parse_offer("We require a 20% advance upfront.");
        assert_eq!(offer.advance_payment_percent, Some(20.0));
    }

    #[test]
    fn test_parses_warranty_months() {
        let offer = parse_offer("Includes a 12-month warranty.");
        assert_eq!(offer.warranty_months, Some(12));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let offer = parse_offer("Let's talk tomorrow.");
        assert_eq!(offer.total_price, None);
        assert_eq!(offer.payment_terms, None);
    }

    #[test]
    fn test_detects_euro_symbol() {
        assert_eq!(detect_currency("Price is €900 total."), Some(CurrencyCode::Eur));
    }

    #[test]
    fn test_detects_no_currency_on_bare_usd_suffix() {
        assert_eq!(detect_currency("980 USD total."), None);
    }

    #[test]
    fn test_converts_price_when_rate_known() {
        let mut rates = ConversionTable::new();
        rates.insert((CurrencyCode::Eur, CurrencyCode::Usd), 1.1);
        let offer = parse_offer_with_currency("Price is €900 total.", CurrencyCode::Usd, &rates);
        assert_eq!(offer.total_price, Some(990.0));
    }

    #[test]
    fn test_leaves_price_unconverted_when_rate_missing() {
        let rates = ConversionTable::new();
        let offer = parse_offer_with_currency("Price is £900 total.", CurrencyCode::Usd, &rates);
        assert_eq!(offer.total_price, Some(900.0));
    }
}
