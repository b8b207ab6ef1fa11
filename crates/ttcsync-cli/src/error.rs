//! Client error types.

use std::fmt;

use ttcsync_advisories::AdvisoryError;
use ttcsync_calendar::CalendarError;
use ttcsync_core::TracingError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a `ttcsync` run.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Advisory stage failed before extraction.
    Advisory(AdvisoryError),
    /// Calendar setup or listing failed.
    Calendar(CalendarError),
    /// Logging could not be initialized.
    Tracing(TracingError),
    /// Output could not be serialized.
    Output(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Advisory(err) => write!(f, "advisory error: {}", err),
            Self::Calendar(err) => write!(f, "calendar error: {}", err),
            Self::Tracing(err) => write!(f, "logging error: {}", err),
            Self::Output(msg) => write!(f, "output error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Advisory(err) => Some(err),
            Self::Calendar(err) => Some(err),
            Self::Tracing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AdvisoryError> for ClientError {
    fn from(err: AdvisoryError) -> Self {
        Self::Advisory(err)
    }
}

impl From<CalendarError> for ClientError {
    fn from(err: CalendarError) -> Self {
        Self::Calendar(err)
    }
}

impl From<TracingError> for ClientError {
    fn from(err: TracingError) -> Self {
        Self::Tracing(err)
    }
}
