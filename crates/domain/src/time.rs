//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for activity dates, run bounds, audit times, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// The Unix epoch, used in place of a missing activity timestamp.
#[must_use]
pub fn epoch() -> Timestamp {
    DateTime::UNIX_EPOCH
}

/// A whole number of days as a [`TimeDelta`].
#[must_use]
pub fn days(count: u32) -> TimeDelta {
    TimeDelta::days(i64::from(count))
}

/// `ts` moved `count` days forward, pinned to the latest representable time.
#[must_use]
pub fn saturating_add_days(ts: Timestamp, count: u32) -> Timestamp {
    ts.checked_add_signed(days(count))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Fractional days elapsed from `since` to `until` (negative if `since` is later).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn days_between(since: Timestamp, until: Timestamp) -> f64 {
    (until - since).num_seconds() as f64 / 86_400.0
}
