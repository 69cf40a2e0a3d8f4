//! Column encoding shared by the repositories.

use chrono::{DateTime, SecondsFormat};

use assetcycle_domain::time::Timestamp;

/// RFC 3339 with a fixed nanosecond precision, so text order is time order.
pub(crate) fn encode_ts(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_ts(value: &str) -> Result<Timestamp, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.to_utc())
        .map_err(decode_error)
}

pub(crate) fn decode_opt_ts(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value.as_deref().map(decode_ts).transpose()
}

pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// SQLite binds `LIMIT` as a signed integer.
pub(crate) fn limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetcycle_domain::time::now;

    #[test]
    fn should_roundtrip_timestamps_without_losing_precision() {
        let ts = now();
        assert_eq!(decode_ts(&encode_ts(ts)).unwrap(), ts);
    }

    #[test]
    fn should_sort_encoded_timestamps_chronologically() {
        let earlier = now();
        let later = earlier + chrono::TimeDelta::milliseconds(1);
        assert!(encode_ts(earlier) < encode_ts(later));
    }

    #[test]
    fn should_reject_malformed_timestamp() {
        assert!(matches!(decode_ts("yesterday"), Err(sqlx::Error::Decode(_))));
    }
}
