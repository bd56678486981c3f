//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags or environment
//! variables. With no arguments the program fetches the built-in feeds and
//! writes `docs/data/news.json`.

use crate::feeds::FetchSettings;
use crate::outputs::json::DEFAULT_OUTPUT_PATH;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in feeds, default output path
/// news_snapshot
///
/// # Custom registry and output
/// news_snapshot --feeds feeds.yaml -o site/data/news.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Where to write the JSON snapshot
    #[arg(short, long, env = "NEWS_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// YAML feed registry to use instead of the built-in feeds
    #[arg(short, long, env = "NEWS_FEEDS")]
    pub feeds: Option<PathBuf>,

    /// Maximum entries kept from each feed
    #[arg(long, env = "NEWS_MAX_ITEMS", default_value_t = 30)]
    pub max_items_per_feed: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "NEWS_TIMEOUT_SECS", default_value_t = 20)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "NEWS_USER_AGENT", default_value = "aiedutech-news-bot/1.0")]
    pub user_agent: String,

    /// Number of feeds fetched at once
    #[arg(long, env = "NEWS_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,
}

impl Cli {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            max_items_per_feed: self.max_items_per_feed,
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            concurrency: self.concurrency.max(1),
        }
    }
}
