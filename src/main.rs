//! # News Snapshot
//!
//! Fetches a small set of RSS/Atom feeds, normalizes and deduplicates their
//! items, and writes a single JSON snapshot for a static site to read.
//!
//! ## Usage
//!
//! ```sh
//! news_snapshot                     # built-in feeds -> docs/data/news.json
//! news_snapshot --feeds feeds.yaml  # custom registry
//! ```
//!
//! ## Architecture
//!
//! One linear pipeline per invocation:
//! 1. **Registry**: the ordered list of feeds, grouped by category
//! 2. **Fetching**: download and parse each feed; a failing feed is logged and skipped
//! 3. **Normalizing**: canonical item shape, Google News links unwrapped
//! 4. **Dedupe/sort**: first occurrence wins, newest first
//! 5. **Output**: pretty-printed JSON, replaced whole
//!
//! Any error outside the per-feed scope ends the run with a non-zero exit code.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod feeds;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod registry;
mod utils;

use cli::Cli;
use feeds::HttpFeedClient;
use registry::FeedRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let registry = match &args.feeds {
        Some(path) => FeedRegistry::load(path).await.inspect_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load feed registry");
        })?,
        None => FeedRegistry::builtin(),
    };

    let settings = args.fetch_settings();
    let client = HttpFeedClient::new(&settings)?;

    let outcome = pipeline::run(&client, &registry, &settings, &args.output)
        .await
        .inspect_err(|e| error!(error = %e, "Run failed"))?;

    for failure in &outcome.failures {
        debug!(url = %failure.url, message = %failure.message, "Feed skipped this run");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        items = outcome.snapshot.items.len(),
        failed_feeds = outcome.failures.len(),
        "Execution complete"
    );

    Ok(())
}
