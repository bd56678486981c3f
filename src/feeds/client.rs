//! HTTP transport for feeds.

use super::{FeedClient, FetchSettings};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument};

/// [`FeedClient`] backed by a shared `reqwest::Client`.
///
/// The timeout and user agent are fixed when the client is built and apply to
/// every request. Non-success status codes are reported as errors.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    http: reqwest::Client,
}

impl HttpFeedClient {
    /// Build a client from the run's fetch settings.
    pub fn new(settings: &FetchSettings) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }
}

impl FeedClient for HttpFeedClient {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, bytes = body.len(), "HTTP fetch complete");
        Ok(body)
    }
}
