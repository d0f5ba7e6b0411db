// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time conversion and formatting.
//!
//! NK reports times as milliseconds since the epoch in the wall-clock time of
//! wherever the session was recorded. We treat those values as if they were UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert NK epoch milliseconds to a UTC timestamp, `None` if out of range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Serde adapter for NK epoch-millisecond fields.
pub fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = i64::deserialize(deserializer)?;
    from_epoch_millis(millis).ok_or_else(|| {
        serde::de::Error::custom(format!("timestamp {} ms is out of range", millis))
    })
}

/// Convert a timestamp to epoch milliseconds (the unit NK query parameters use).
pub fn to_epoch_millis(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Parse a date given either as RFC3339 or as a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date_param(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
