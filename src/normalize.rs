//! Mapping raw feed entries to canonical [`NewsItem`]s.
//!
//! Besides trimming and defaulting, links from the Google News redirector are
//! unwrapped to the article they point at. Unwrapping is best effort: a link
//! that does not parse, or does not match, is returned unchanged.

use crate::models::{NewsItem, RawEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

const AGGREGATOR_HOST: &str = "news.google.com";

static EMBEDDED_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://news\.google\.com/.*?(https?://[^&]+)").expect("static regex")
});

/// Extract the destination from a `news.google.com` link.
///
/// Tries a `url` query parameter first, then an `http(s)://` URL embedded
/// later in the link text (up to the first `&`).
pub fn unwrap_link(link: &str) -> String {
    let Ok(parsed) = Url::parse(link) else {
        return link.to_string();
    };
    if parsed.host_str() != Some(AGGREGATOR_HOST) {
        return link.to_string();
    }

    if let Some((_, value)) = parsed.query_pairs().find(|(k, _)| k == "url") {
        if !value.is_empty() {
            // redirector values are sometimes encoded twice; a value that
            // does not decode leaves the link as it was
            return match urlencoding::decode(&value) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => link.to_string(),
            };
        }
    }

    if let Some(m) = EMBEDDED_URL.captures(link).and_then(|c| c.get(1)) {
        return m.as_str().to_string();
    }

    link.to_string()
}

/// Normalize one entry from a feed belonging to `group`/`source`.
pub fn normalize_entry(entry: RawEntry, group: &str, source: &str) -> NewsItem {
    NewsItem {
        group: group.to_string(),
        source: source.to_string(),
        title: entry.title.as_deref().unwrap_or_default().trim().to_string(),
        link: unwrap_link(entry.link.as_deref().unwrap_or_default()),
        published_at: entry.published.map(|p| p.to_output()),
    }
}
