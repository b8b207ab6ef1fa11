//! Service advisory ingestion.
//!
//! This crate turns the TTC subway advisory search widget into a list of
//! [`Event`](ttcsync_core::Event)s:
//!
//! ```text
//! landing page ──► QueryParameters ──► search URL ──► SearchResults
//!                                                         │
//!                                      EventExtractor ◄───┘
//!                                            │
//!                                            ▼
//!                                    ExtractionReport
//! ```
//!
//! - [`AdvisorySource`] - where documents come from (HTTP or canned)
//! - [`AdvisoryFetcher`] - the two sequential requests
//! - [`AdvisoryMarkup`] - versioned adapter over the fragment markup
//! - [`EventExtractor`] - per-advisory extraction with skip-and-continue
//!
//! # Example
//!
//! ```ignore
//! use ttcsync_advisories::{
//!     AdvisoryFetcher, CannedAdvisorySource, EventExtractor, run_advisory_stage,
//! };
//!
//! let fetcher = AdvisoryFetcher::new(CannedAdvisorySource::default());
//! let report = run_advisory_stage(&fetcher, &EventExtractor::default()).await?;
//! ```

pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod markup;
pub mod query;
pub mod results;
pub mod source;

pub use error::{AdvisoryError, AdvisoryResult};
pub use extract::{EventExtractor, ExtractionReport, SkippedAdvisory};
pub use fetch::{AdvisoryFetcher, run_advisory_stage};
pub use http::{DEFAULT_LANDING_PAGE_URL, HttpAdvisorySource, SourceConfig};
pub use markup::{AdvisoryMarkup, DEFAULT_HOST_PREFIX, MarkupSelectors, RouteCasing};
pub use query::{QueryParameters, extract_query_parameters};
pub use results::{RawAdvisory, SearchResults, decode_search_results};
pub use source::{AdvisorySource, BoxFuture, CannedAdvisorySource};
