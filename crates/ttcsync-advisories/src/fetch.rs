//! The advisory stage of the pipeline.
//!
//! [`AdvisoryFetcher`] performs the two sequential requests (landing page,
//! then search results) against an [`AdvisorySource`];
//! [`run_advisory_stage`] chains them with decoding and extraction.

use tracing::{debug, info};
use url::Url;

use crate::error::AdvisoryResult;
use crate::extract::{EventExtractor, ExtractionReport};
use crate::query::{QueryParameters, extract_query_parameters};
use crate::results::decode_search_results;
use crate::source::AdvisorySource;

/// Fetches advisory documents through an injected source.
#[derive(Debug)]
pub struct AdvisoryFetcher<S> {
    source: S,
}

impl<S: AdvisorySource> AdvisoryFetcher<S> {
    /// Creates a fetcher over the given source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches the landing page and reads the search widget configuration.
    ///
    /// # Errors
    ///
    /// Network errors from the source, or
    /// [`AdvisoryError::ParameterExtraction`] when the page does not carry
    /// the configuration.
    ///
    /// [`AdvisoryError::ParameterExtraction`]: crate::error::AdvisoryError::ParameterExtraction
    pub async fn fetch_landing_page_parameters(&self) -> AdvisoryResult<QueryParameters> {
        let page = self.source.fetch_landing_page().await?;
        debug!("landing page: {} bytes from {} source", page.len(), self.source.name());
        extract_query_parameters(&page)
    }

    /// Fetches the raw search results body.
    pub async fn fetch_search_results(&self, url: &Url) -> AdvisoryResult<String> {
        let body = self.source.fetch_search_results(url).await?;
        debug!("search results: {} bytes", body.len());
        Ok(body)
    }
}

/// Runs the whole advisory stage: parameters, query URL, search results,
/// extraction.
///
/// # Errors
///
/// Any failure before extraction aborts the stage. Failures on individual
/// advisories do not; they are reported in [`ExtractionReport::skipped`].
pub async fn run_advisory_stage<S: AdvisorySource>(
    fetcher: &AdvisoryFetcher<S>,
    extractor: &EventExtractor,
) -> AdvisoryResult<ExtractionReport> {
    let params = fetcher.fetch_landing_page_parameters().await?;
    let url = params.to_url()?;
    info!("querying advisories at {}", url);

    let body = fetcher.fetch_search_results(&url).await?;
    let results = decode_search_results(&body)?;

    let report = extractor.extract_all(&results.results);
    info!(
        "extracted {} events ({} skipped) from {} advisories",
        report.events.len(),
        report.skipped_count(),
        results.results.len()
    );
    Ok(report)
}
