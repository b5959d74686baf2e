//! Time helpers shared across components. Components never call
//! `Utc::now()` directly so their output stays deterministic under
//! test; only the pipeline (the I/O boundary) reads the clock.

use chrono::{DateTime, NaiveDate, Utc};

/// Convert a delivery day-count (relative to `from`) into an absolute
/// date.
pub fn days_from(from: DateTime<Utc>, days: u32) -> NaiveDate {
    (from + chrono::Duration::days(days as i64)).date_naive()
}

/// Whole days between two dates, clamped to zero if `to` is not after
/// `from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    (to - from).num_days().max(0) as u32
}
