//! The fetch → normalize → dedupe → sort → write pipeline.
//!
//! One call to [`run`] is one run of the program. Feeds are fetched in
//! registry order (optionally several at a time, with results still consumed
//! in order), a failing feed contributes nothing, and the final ordering
//! depends only on the items themselves.

use crate::feeds::{FeedClient, FetchSettings, fetch_source};
use crate::models::{FeedSource, NewsItem, NewsSnapshot};
use crate::normalize::normalize_entry;
use crate::outputs::json;
use crate::registry::FeedRegistry;
use crate::utils::timestamp_millis;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::cmp::Reverse;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};

/// A feed that could not be fetched or parsed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub url: String,
    pub message: String,
}

/// Everything gathered from the registry, before dedupe and sort.
#[derive(Debug, Default)]
pub struct Collected {
    pub items: Vec<NewsItem>,
    pub failures: Vec<FeedFailure>,
}

/// Result of a complete run.
#[derive(Debug)]
pub struct RunOutcome {
    pub snapshot: NewsSnapshot,
    pub failures: Vec<FeedFailure>,
}

/// Fetch every source and normalize its entries.
///
/// Each failing source is logged once with its URL and skipped. Items keep
/// registry order regardless of `settings.concurrency`.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn collect_items<C: FeedClient>(
    client: &C,
    sources: &[FeedSource],
    settings: &FetchSettings,
) -> Collected {
    let results: Vec<_> = stream::iter(sources)
        .map(|source| async move {
            let res = fetch_source(client, source, settings.max_items_per_feed).await;
            (source, res)
        })
        .buffered(settings.concurrency.max(1))
        .collect()
        .await;

    let mut collected = Collected::default();
    for (source, res) in results {
        match res {
            Ok(entries) => {
                debug!(url = %source.url, count = entries.len(), "Feed fetched");
                collected.items.extend(
                    entries
                        .into_iter()
                        .map(|e| normalize_entry(e, &source.group, &source.name)),
                );
            }
            Err(e) => {
                error!(url = %source.url, error = %e, "Feed error");
                collected.failures.push(FeedFailure {
                    url: source.url.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    collected
}

/// Drop items whose dedupe key was already seen; the first occurrence wins.
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    items.into_iter().unique_by(NewsItem::dedupe_key).collect()
}

/// Stable sort by `publishedAt`, newest first. Undated items go last.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by_cached_key(|it| Reverse(timestamp_millis(it.published_at.as_deref())));
}

/// Fetch all feeds in `registry` and assemble the snapshot.
pub async fn build_snapshot<C: FeedClient>(
    client: &C,
    registry: &FeedRegistry,
    settings: &FetchSettings,
) -> RunOutcome {
    let generated_at = Utc::now();
    let sources = registry.sources();
    let Collected { items, failures } = collect_items(client, &sources, settings).await;

    let fetched = items.len();
    let mut items = dedupe(items);
    debug!(fetched, kept = items.len(), "Deduplicated items");
    sort_newest_first(&mut items);

    RunOutcome {
        snapshot: NewsSnapshot::new(generated_at, items),
        failures,
    }
}

/// Run the whole pipeline and write the snapshot to `output`.
///
/// # Errors
///
/// Only writing the output can fail the run; feed failures are reported in
/// the returned [`RunOutcome`].
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn run<C: FeedClient>(
    client: &C,
    registry: &FeedRegistry,
    settings: &FetchSettings,
    output: &Path,
) -> Result<RunOutcome, Box<dyn Error>> {
    let outcome = build_snapshot(client, registry, settings).await;
    json::write_snapshot(&outcome.snapshot, output).await?;
    info!(
        items = outcome.snapshot.items.len(),
        generated_at = %outcome.snapshot.generated_at,
        failed_feeds = outcome.failures.len(),
        "Wrote {} items at {}",
        outcome.snapshot.items.len(),
        outcome.snapshot.generated_at
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FeedEntry, FeedGroup};
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Serves canned bodies by URL; unknown URLs fail like a dead host.
    #[derive(Default)]
    struct FakeClient {
        bodies: HashMap<String, String>,
    }

    impl FakeClient {
        fn with(mut self, url: &str, body: String) -> Self {
            self.bodies.insert(url.to_string(), body);
            self
        }
    }

    impl FeedClient for FakeClient {
        async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or_else(|| format!("connection refused: {url}").into())
        }
    }

    fn rss(items: &[(&str, &str, Option<&str>)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, date)| {
                let date = date.map(|d| format!("<pubDate>{d}</pubDate>")).unwrap_or_default();
                format!("<item><title>{title}</title><link>{link}</link>{date}</item>")
            })
            .collect();
        format!(r#"<rss version="2.0"><channel><title>f</title>{body}</channel></rss>"#)
    }

    fn registry(groups: &[(&str, &[(&str, &str)])]) -> FeedRegistry {
        FeedRegistry {
            groups: groups
                .iter()
                .map(|(name, feeds)| FeedGroup {
                    name: name.to_string(),
                    feeds: feeds
                        .iter()
                        .map(|(n, u)| FeedEntry {
                            name: n.to_string(),
                            url: u.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn item(title: &str, link: &str, published_at: Option<&str>) -> NewsItem {
        NewsItem {
            group: "g".to_string(),
            source: "s".to_string(),
            title: title.to_string(),
            link: link.to_string(),
            published_at: published_at.map(str::to_string),
        }
    }

    #[test]
    fn test_dedupe_first_wins() {
        let items = vec![
            item("First", "https://example.com/x", None),
            item("Second", "HTTPS://EXAMPLE.COM/X", None),
            item("Third", "https://example.com/y", None),
        ];
        let out = dedupe(items);
        let titles: Vec<_> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }

    #[test]
    fn test_dedupe_by_title_when_link_empty() {
        let items = vec![
            item("Same Title", "", None),
            item("same title", "", None),
            item("", "", None),
            item("", "", None),
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Same Title");
        assert_eq!(out[1].title, "");
    }

    #[test]
    fn test_sort_newest_first_with_undated_last() {
        let mut items = vec![
            item("undated", "a", None),
            item("old", "b", Some("Mon, 05 May 2025 10:00:00 GMT")),
            item("garbage", "c", Some("whenever")),
            item("new", "d", Some("2025-05-06T10:00:00.000Z")),
        ];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated", "garbage"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let ts = Some("2025-05-06T10:00:00.000Z");
        let mut items = vec![
            item("a", "1", ts),
            item("b", "2", ts),
            item("c", "3", None),
            item("d", "4", ts),
        ];
        sort_newest_first(&mut items);
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_build_snapshot_orders_and_dedupes_across_feeds() {
        let client = FakeClient::default()
            .with(
                "https://one.example/rss",
                rss(&[
                    ("Shared (one)", "https://example.com/shared", Some("Mon, 05 May 2025 10:00:00 GMT")),
                    ("Only one", "https://example.com/one", Some("Tue, 06 May 2025 10:00:00 GMT")),
                ]),
            )
            .with(
                "https://two.example/rss",
                rss(&[
                    ("Shared (two)", "https://example.com/shared", Some("Wed, 07 May 2025 10:00:00 GMT")),
                    ("Undated", "https://example.com/undated", None),
                ]),
            );
        let registry = registry(&[
            ("domestic", &[("One", "https://one.example/rss")]),
            ("overseas", &[("Two", "https://two.example/rss")]),
        ]);

        let outcome = build_snapshot(&client, &registry, &FetchSettings::default()).await;
        assert!(outcome.failures.is_empty());

        let titles: Vec<_> = outcome
            .snapshot
            .items
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Only one", "Shared (one)", "Undated"]);

        let shared = &outcome.snapshot.items[1];
        assert_eq!(shared.group, "domestic");
        assert_eq!(shared.source, "One");
        assert_eq!(shared.published_at.as_deref(), Some("2025-05-05T10:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_concurrency_does_not_change_output() {
        let mut client = FakeClient::default();
        let mut feeds = Vec::new();
        for i in 0..6 {
            let url = format!("https://feed{i}.example/rss");
            let link = format!("https://example.com/{i}");
            client = client.with(&url, rss(&[(&format!("item {i}"), &link, None)]));
            feeds.push((format!("Feed {i}"), url));
        }
        let feed_refs: Vec<(&str, &str)> =
            feeds.iter().map(|(n, u)| (n.as_str(), u.as_str())).collect();
        let registry = registry(&[("g", &feed_refs)]);

        let sequential = build_snapshot(&client, &registry, &FetchSettings::default()).await;
        let parallel = build_snapshot(
            &client,
            &registry,
            &FetchSettings {
                concurrency: 4,
                ..FetchSettings::default()
            },
        )
        .await;
        assert_eq!(sequential.snapshot.items, parallel.snapshot.items);
    }

    #[tokio::test]
    async fn test_failing_feed_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("docs").join("data").join("news.json");
        let client = FakeClient::default().with(
            "https://ok.example/rss",
            rss(&[("Survivor", "https://example.com/ok", None)]),
        );
        let registry = registry(&[(
            "domestic",
            &[
                ("Broken", "https://broken.example/rss"),
                ("Working", "https://ok.example/rss"),
            ],
        )]);

        let outcome = run(&client, &registry, &FetchSettings::default(), &output)
            .await
            .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].url, "https://broken.example/rss");
        assert!(outcome.failures[0].message.contains("connection refused"));

        let written = json::read_snapshot(&output).await.unwrap();
        assert_eq!(written.items.len(), 1);
        assert_eq!(written.items[0].title, "Survivor");
        assert_eq!(written.items[0].source, "Working");
    }

    #[tokio::test]
    async fn test_failing_feed_logs_one_error_line() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::ERROR)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = FakeClient::default().with(
            "https://ok.example/rss",
            rss(&[("Survivor", "https://example.com/ok", None)]),
        );
        let registry = registry(&[(
            "domestic",
            &[
                ("Broken", "https://broken.example/rss"),
                ("Working", "https://ok.example/rss"),
            ],
        )]);
        build_snapshot(&client, &registry, &FetchSettings::default()).await;

        let lines = logs.lines();
        let broken: Vec<_> = lines
            .iter()
            .filter(|l| l.contains("https://broken.example/rss"))
            .collect();
        assert_eq!(broken.len(), 1, "log output: {lines:?}");
        assert!(broken[0].contains("ERROR"));
        assert!(broken[0].contains("connection refused"));
        assert!(!lines.iter().any(|l| l.contains("https://ok.example/rss")));
    }

    #[tokio::test]
    async fn test_malformed_feed_counts_as_failure() {
        let client = FakeClient::default().with("https://html.example/", "<html></html>".to_string());
        let registry = registry(&[("g", &[("Html", "https://html.example/")])]);

        let outcome = build_snapshot(&client, &registry, &FetchSettings::default()).await;
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.snapshot.items.is_empty());
    }

    #[tokio::test]
    async fn test_empty_registry_still_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("news.json");

        let outcome = run(
            &FakeClient::default(),
            &FeedRegistry::default(),
            &FetchSettings::default(),
            &output,
        )
        .await
        .unwrap();
        assert!(outcome.failures.is_empty());

        let written = json::read_snapshot(&output).await.unwrap();
        assert!(written.items.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&written.generated_at).is_ok());
        assert!(written.generated_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_unwritable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("docs");
        tokio::fs::write(&blocker, "file").await.unwrap();

        let result = run(
            &FakeClient::default(),
            &FeedRegistry::default(),
            &FetchSettings::default(),
            &blocker.join("news.json"),
        )
        .await;
        assert!(result.is_err());
    }
}
