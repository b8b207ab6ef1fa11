//! Advisory source abstraction.
//!
//! The pipeline only needs two documents: the landing page (for the search
//! widget configuration) and the search results. [`AdvisorySource`] is the
//! seam between the pipeline and the network, so tests and offline runs can
//! use [`CannedAdvisorySource`] instead of [`HttpAdvisorySource`].
//!
//! [`HttpAdvisorySource`]: crate::http::HttpAdvisorySource

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use url::Url;

use crate::error::AdvisoryResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps [`AdvisorySource`] object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Canned landing page carrying the search widget configuration.
pub const CANNED_LANDING_PAGE: &str = include_str!("../fixtures/landing_page.html");

/// Canned search results holding five subway advisories from March 2022.
pub const CANNED_SEARCH_RESULTS: &str = include_str!("../fixtures/search_results.json");

/// Where advisory documents come from.
pub trait AdvisorySource: Send + Sync {
    /// Returns the name of this source (e.g., "http", "canned").
    fn name(&self) -> &str;

    /// Fetches the advisory landing page HTML.
    fn fetch_landing_page(&self) -> BoxFuture<'_, AdvisoryResult<String>>;

    /// Fetches the raw search results body for the given query URL.
    fn fetch_search_results<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, AdvisoryResult<String>>;
}

/// A source returning fixed payloads without touching the network.
///
/// Requested search URLs are recorded so tests can check what the pipeline
/// asked for.
#[derive(Debug)]
pub struct CannedAdvisorySource {
    landing_page: String,
    search_results: String,
    requested: Mutex<Vec<String>>,
}

impl CannedAdvisorySource {
    /// Creates a source serving the given documents.
    pub fn new(landing_page: impl Into<String>, search_results: impl Into<String>) -> Self {
        Self {
            landing_page: landing_page.into(),
            search_results: search_results.into(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Returns the search URLs requested so far.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl Default for CannedAdvisorySource {
    /// Serves the bundled March 2022 snapshot.
    fn default() -> Self {
        Self::new(CANNED_LANDING_PAGE, CANNED_SEARCH_RESULTS)
    }
}

impl AdvisorySource for CannedAdvisorySource {
    fn name(&self) -> &str {
        "canned"
    }

    fn fetch_landing_page(&self) -> BoxFuture<'_, AdvisoryResult<String>> {
        let page = self.landing_page.clone();
        Box::pin(async move { Ok(page) })
    }

    fn fetch_search_results<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, AdvisoryResult<String>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        let body = self.search_results.clone();
        Box::pin(async move { Ok(body) })
    }
}
