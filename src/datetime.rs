//! Date/time utilities for Loft.
//!
//! Timestamps are stored as SQLite `datetime('now')` text (UTC,
//! `YYYY-MM-DD HH:MM:SS`). These helpers convert between that format and
//! `DateTime<Utc>`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// The SQLite text timestamp format.
pub const SQLITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time formatted as a SQLite text timestamp.
pub fn now_string() -> String {
    Utc::now().format(SQLITE_FORMAT).to_string()
}

/// Parse a stored timestamp into `DateTime<Utc>`.
///
/// Accepts the SQLite format and RFC 3339; returns None on anything else.
pub fn parse(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, SQLITE_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// A timestamp `days` days from now, as a SQLite text timestamp.
pub fn days_from_now_string(days: i64) -> String {
    (Utc::now() + chrono::Duration::days(days))
        .format(SQLITE_FORMAT)
        .to_string()
}

/// Whether a stored timestamp lies in the past.
///
/// Unparseable timestamps are treated as past (closed fail mode).
pub fn is_past(datetime_str: &str) -> bool {
    match parse(datetime_str) {
        Some(dt) => dt <= Utc::now(),
        None => true,
    }
}
