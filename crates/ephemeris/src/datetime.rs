//! Trace date-time parsing and the label format used for records.
//!
//! Traces carry labels such as `Friday, December 20, 2024 00:00:00`. Commas are dropped before
//! parsing and all values are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::EphemerisError;

/// Label format written alongside every record (commas removed).
pub const LABEL_FORMAT: &str = "%A %B %d %Y %H:%M:%S";

const DATE_TIME_FORMATS: [&str; 3] = [LABEL_FORMAT, "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a trace or configuration date into unix seconds.
pub fn parse_timestamp(raw: &str) -> Result<f64, EphemerisError> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Ok(naive.and_utc().timestamp() as f64);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp() as f64);
        }
    }
    Err(EphemerisError::InvalidDate(raw.to_string()))
}

/// Render unix seconds with [`LABEL_FORMAT`]. Fractional seconds are truncated.
pub fn format_timestamp(unix_seconds: f64) -> String {
    match DateTime::<Utc>::from_timestamp(unix_seconds.floor() as i64, 0) {
        Some(moment) => moment.format(LABEL_FORMAT).to_string(),
        None => format!("{unix_seconds} s"),
    }
}
