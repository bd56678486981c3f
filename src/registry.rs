//! The feed registry: which feeds are fetched, and under which group.
//!
//! The registry is an explicit value handed to the pipeline. The built-in
//! default can be replaced by a YAML file passed with `--feeds`:
//!
//! ```yaml
//! groups:
//!   - name: domestic
//!     feeds:
//!       - name: Google News KR Top
//!         url: https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko
//! ```
//!
//! Group and feed order is significant. It decides which duplicate survives
//! deduplication.

use crate::models::FeedSource;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// A single feed inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedEntry {
    pub name: String,
    pub url: String,
}

/// A named category of feeds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedGroup {
    pub name: String,
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// The full, ordered set of feeds for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedRegistry {
    #[serde(default)]
    pub groups: Vec<FeedGroup>,
}

fn feed(name: &str, url: &str) -> FeedEntry {
    FeedEntry {
        name: name.to_string(),
        url: url.to_string(),
    }
}

impl FeedRegistry {
    /// The registry used when no `--feeds` file is given.
    pub fn builtin() -> Self {
        Self {
            groups: vec![
                FeedGroup {
                    name: "domestic".to_string(),
                    feeds: vec![
                        feed(
                            "Google News KR Top",
                            "https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko",
                        ),
                        feed(
                            "Google News KR Tech",
                            "https://news.google.com/rss/headlines/section/topic/TECHNOLOGY?hl=ko&gl=KR&ceid=KR:ko",
                        ),
                    ],
                },
                FeedGroup {
                    name: "overseas".to_string(),
                    feeds: vec![
                        feed(
                            "Google News World (KR)",
                            "https://news.google.com/rss/headlines/section/topic/WORLD?hl=ko&gl=KR&ceid=KR:ko",
                        ),
                        feed("The Guardian World", "https://www.theguardian.com/world/rss"),
                    ],
                },
            ],
        }
    }

    /// Parse a registry from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a registry from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = tokio::fs::read_to_string(path).await?;
        let registry = Self::from_yaml(&text)?;
        info!(
            groups = registry.groups.len(),
            feeds = registry.groups.iter().map(|g| g.feeds.len()).sum::<usize>(),
            "Loaded feed registry"
        );
        Ok(registry)
    }

    /// Flatten into fetch order: by group, then by feed within the group.
    pub fn sources(&self) -> Vec<FeedSource> {
        self.groups
            .iter()
            .flat_map(|group| {
                group.feeds.iter().map(move |f| FeedSource {
                    group: group.name.clone(),
                    name: f.name.clone(),
                    url: f.url.clone(),
                })
            })
            .collect()
    }
}
