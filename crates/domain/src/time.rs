//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for installation dates, interventions, event times, etc.
pub type Timestamp = DateTime<Utc>;

/// Average length of a Gregorian month in days.
const DAYS_PER_MONTH: f64 = 30.4375;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Fractional number of months elapsed between `since` and `until`.
///
/// Returns `0.0` when `until` is before `since`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_months(since: Timestamp, until: Timestamp) -> f64 {
    let seconds = (until - since).num_seconds().max(0) as f64;
    seconds / 86_400.0 / DAYS_PER_MONTH
}
