//! Timestamp formatting for manifests and archive properties.
//!
//! Record timestamps are epoch milliseconds; manifests and the
//! `backup.properties` sidecar carry RFC 3339 strings in UTC.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{CoreError, CoreResult};

/// Returns the current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Formats epoch milliseconds as an RFC 3339 UTC timestamp.
///
/// Out-of-range values clamp to the epoch.
#[must_use]
pub fn format_datetime_ms(epoch_ms: u64) -> String {
    let dt = Utc
        .timestamp_millis_opt(i64::try_from(epoch_ms).unwrap_or(0))
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp into a UTC date-time.
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] if the string is not a valid timestamp.
pub fn parse_datetime(value: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::encoding(format!("bad timestamp {value:?}: {e}")))
}
