//! Error types for advisory fetching and extraction.
//!
//! Errors fall in two groups. Pipeline errors (`Network`,
//! `ParameterExtraction`, `MalformedEndpoint`, `InvalidResponse`) leave
//! nothing usable and abort the run. Per-advisory errors (`LinkNotFound`,
//! `DateRange`, `InvalidDateRange`) only cost the advisory they occurred on.

use chrono::NaiveDate;
use thiserror::Error;
use ttcsync_core::DateRangeError;

/// Result type for advisory operations.
pub type AdvisoryResult<T> = Result<T, AdvisoryError>;

/// Errors that can occur while fetching or extracting advisories.
#[derive(Debug, Error)]
pub enum AdvisoryError {
    /// Transport failure or non-success HTTP status.
    #[error("network error: {message}")]
    Network { message: String, retryable: bool },

    /// The landing page does not carry the query parameters.
    #[error("unable to extract query parameters: {message}")]
    ParameterExtraction { message: String },

    /// The endpoint in the query parameters is not an absolute URL.
    #[error("malformed search endpoint {endpoint:?}: {source}")]
    MalformedEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    /// The search response could not be decoded.
    #[error("invalid search response: {message}")]
    InvalidResponse { message: String },

    /// A CSS selector in the markup adapter does not parse.
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },

    /// The advisory fragment has no link.
    #[error("unable to find link in advisory")]
    LinkNotFound,

    /// The effective-date subtitle could not be parsed.
    #[error("unable to parse effective date subtitle: {0}")]
    DateRange(#[from] DateRangeError),

    /// The advisory ends before it starts.
    #[error("advisory ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

impl AdvisoryError {
    /// Creates a retryable network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a network error that retrying will not fix (4xx statuses).
    pub fn network_permanent(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a parameter extraction error.
    pub fn parameter_extraction(message: impl Into<String>) -> Self {
        Self::ParameterExtraction {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Returns true if the failed request may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { retryable: true, .. })
    }
}
