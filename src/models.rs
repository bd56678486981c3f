//! Data models for feed sources, parsed entries, and the published snapshot.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedSource`]: One feed from the registry, tagged with its group
//! - [`RawEntry`]: One item as it came out of a feed document
//! - [`PublishedDate`]: The two shapes a publication date arrives in
//! - [`NewsItem`]: The canonical, normalized item
//! - [`NewsSnapshot`]: The collection written to disk once per run
//!
//! Output structs serialize with camelCase keys to match the JSON consumed by
//! the static site.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A single feed to fetch, flattened out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    /// The category this feed belongs to (e.g. `"domestic"`).
    pub group: String,
    /// Human-readable source name, copied onto every item.
    pub name: String,
    /// The feed URL.
    pub url: String,
}

/// Publication date of a feed entry.
///
/// Feeds disagree on date formats. A date that parses is carried as a
/// timestamp, anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedDate {
    Iso(DateTime<Utc>),
    Raw(String),
}

impl PublishedDate {
    /// Classify a raw date string from a feed.
    pub fn from_raw(raw: &str) -> Self {
        match crate::utils::parse_feed_date(raw) {
            Some(dt) => PublishedDate::Iso(dt),
            None => PublishedDate::Raw(raw.to_string()),
        }
    }

    /// Render the date the way it appears in `publishedAt`.
    ///
    /// Parsed dates use `YYYY-MM-DDTHH:MM:SS.mmmZ`; raw strings pass through.
    pub fn to_output(&self) -> String {
        match self {
            PublishedDate::Iso(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            PublishedDate::Raw(s) => s.clone(),
        }
    }
}

/// An entry extracted from a feed document, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<PublishedDate>,
}

/// A normalized news item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub group: String,
    pub source: String,
    pub title: String,
    pub link: String,
    pub published_at: Option<String>,
}

impl NewsItem {
    /// The key two items are compared by when deduplicating.
    ///
    /// Lower-cased link, or lower-cased title when the link is empty.
    pub fn dedupe_key(&self) -> String {
        if self.link.is_empty() {
            self.title.to_lowercase()
        } else {
            self.link.to_lowercase()
        }
    }
}

/// The output document for one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSnapshot {
    /// Generation time in `YYYY-MM-DDTHH:MM:SS.mmmZ` form.
    pub generated_at: String,
    pub items: Vec<NewsItem>,
}

impl NewsSnapshot {
    /// Create a snapshot stamped with the given time.
    pub fn new(generated_at: DateTime<Utc>, items: Vec<NewsItem>) -> Self {
        Self {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            items,
        }
    }
}
