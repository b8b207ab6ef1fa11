//! HTTP advisory source.
//!
//! Plain GET requests with an explicit timeout. Transport errors, 429 and
//! 5xx responses are retried following the configured [`RetryPolicy`]; other
//! non-success statuses fail immediately.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};
use ttcsync_core::RetryPolicy;
use url::Url;

use crate::error::{AdvisoryError, AdvisoryResult};
use crate::source::{AdvisorySource, BoxFuture};

/// Default advisory listing page.
pub const DEFAULT_LANDING_PAGE_URL: &str = "https://www.ttc.ca/service-advisories/subway-service";

/// Settings for [`HttpAdvisorySource`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Advisory listing page holding the search widget.
    pub landing_page_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
}

impl SourceConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            landing_page_url: DEFAULT_LANDING_PAGE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("ttcsync/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches advisory documents over HTTP.
#[derive(Debug)]
pub struct HttpAdvisorySource {
    http_client: reqwest::Client,
    config: SourceConfig,
}

impl HttpAdvisorySource {
    /// Creates a new source.
    ///
    /// # Errors
    ///
    /// Returns a network error if the HTTP client cannot be built (TLS
    /// backend initialization).
    pub fn new(config: SourceConfig) -> AdvisoryResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AdvisoryError::network_permanent(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the source configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn get_text(&self, url: &str) -> AdvisoryResult<String> {
        with_retry(&self.config.retry, url, || self.get_once(url)).await
    }

    async fn get_once(&self, url: &str) -> AdvisoryResult<String> {
        debug!("GET {}", url);

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AdvisoryError::network(format!("request to {} timed out", url))
            } else if e.is_connect() {
                AdvisoryError::network(format!("connection failed: {}", e))
            } else {
                AdvisoryError::network(format!("request failed: {}", e))
            }
        })?;

        if let Some(err) = status_error(response.status()) {
            return Err(err);
        }

        response
            .text()
            .await
            .map_err(|e| AdvisoryError::network(format!("failed to read response: {}", e)))
    }
}

impl AdvisorySource for HttpAdvisorySource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_landing_page(&self) -> BoxFuture<'_, AdvisoryResult<String>> {
        Box::pin(async move { self.get_text(&self.config.landing_page_url).await })
    }

    fn fetch_search_results<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, AdvisoryResult<String>> {
        Box::pin(async move { self.get_text(url.as_str()).await })
    }
}

/// Maps a response status to an error, or `None` on success.
fn status_error(status: StatusCode) -> Option<AdvisoryError> {
    if status.is_success() {
        return None;
    }

    let message = format!("unexpected status {}", status);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(AdvisoryError::network(message))
    } else {
        Some(AdvisoryError::network_permanent(message))
    }
}

/// Runs `op` until it succeeds, fails permanently, or the policy gives up.
async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> AdvisoryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AdvisoryResult<T>>,
{
    let mut failures = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                failures += 1;
                match policy.delay_after(failures) {
                    Some(delay) => {
                        warn!(
                            "attempt {} for {} failed: {}; retrying in {:?}",
                            failures, what, err, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                }
            }
            Err(err) => return Err(err),
        }
    }
}
