//! Feed fetching.
//!
//! Fetching is split into a transport seam and a format boundary:
//!
//! - [`FeedClient`]: retrieves a feed document by URL ([`client::HttpFeedClient`]
//!   in production, fakes in tests)
//! - [`parser::parse_feed`]: turns the document into [`RawEntry`] values
//!
//! [`fetch_source`] combines both for one registry entry. Callers decide what a
//! failure means; the pipeline logs it and moves on to the next feed.

use crate::models::{FeedSource, RawEntry};
use crate::utils::truncate_for_log;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

pub mod client;
pub mod parser;

pub use client::HttpFeedClient;

/// Settings for fetching that apply to every feed in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Entries kept per feed; the rest are dropped.
    pub max_items_per_feed: usize,
    /// Upper bound on a single request, connect to last byte.
    pub timeout: Duration,
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Feeds fetched at once.
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_items_per_feed: 30,
            timeout: Duration::from_secs(20),
            user_agent: "aiedutech-news-bot/1.0".to_string(),
            concurrency: 1,
        }
    }
}

/// Something that can retrieve a feed document.
pub trait FeedClient {
    /// Fetch the document at `url` and return its body.
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// Fetch and parse one feed, keeping at most `max_items` entries.
///
/// # Errors
///
/// Returns an error if the request fails or the body is not a recognizable
/// feed. Nothing is retried.
#[instrument(level = "info", skip_all, fields(url = %source.url, source = %source.name))]
pub async fn fetch_source<C: FeedClient>(
    client: &C,
    source: &FeedSource,
    max_items: usize,
) -> Result<Vec<RawEntry>, Box<dyn Error>> {
    let body = client.fetch(&source.url).await?;
    debug!(bytes = body.len(), preview = %truncate_for_log(&body, 120), "Fetched feed body");

    let mut entries = parser::parse_feed(&body)?;
    if entries.len() > max_items {
        debug!(total = entries.len(), kept = max_items, "Truncating feed entries");
        entries.truncate(max_items);
    }
    Ok(entries)
}
