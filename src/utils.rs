//! Utility functions for date handling and log formatting.
//!
//! This module provides helper functions used throughout the application:
//! - Lenient parsing of feed date strings
//! - Sort keys for `publishedAt` values
//! - String truncation for logging

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a date string as found in RSS or Atom feeds.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (Atom, `dc:date`), and a couple of
/// zone-less forms that some publishers emit, which are read as UTC.
///
/// # Returns
///
/// `None` when the string matches none of the supported forms.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // publishers get the weekday wrong often enough; it carries no information
    if let Some(dt) = strip_weekday(s).and_then(|rest| DateTime::parse_from_rfc2822(rest).ok()) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// The remainder of an RFC 2822 date after a leading `Ddd,` weekday.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    day.chars()
        .all(|c| c.is_ascii_alphabetic())
        .then(|| rest.trim_start())
}

/// Sort key for a `publishedAt` value, in milliseconds since the epoch.
///
/// Missing or unparseable values count as the epoch itself, so they sort
/// after every dated item.
pub fn timestamp_millis(published_at: Option<&str>) -> i64 {
    published_at
        .and_then(parse_feed_date)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters with an ellipsis and the
/// number of dropped bytes appended. Cuts always land on a char boundary.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}
