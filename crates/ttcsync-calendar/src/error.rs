//! Calendar errors.
//!
//! A sync run only asks two questions of an error: may the call be retried,
//! and did the event fail before anything was sent. [`CalendarErrorCode`]
//! carries exactly those distinctions; the message carries the detail.

use std::fmt;

use thiserror::Error;

/// How a calendar failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarErrorCode {
    /// Timeout, connection failure, 429 or 5xx. Worth another attempt.
    Transient,
    /// The calendar refused the request (401, 403, 404, other 4xx).
    Rejected,
    /// The calendar answered with a body that could not be parsed.
    InvalidResponse,
    /// The event cannot be expressed as a payload; nothing was sent.
    InvalidEvent,
    /// Missing or unusable client settings, including an expired token.
    Configuration,
}

impl CalendarErrorCode {
    /// Machine-readable name, used in log and report lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Rejected => "rejected",
            Self::InvalidResponse => "invalid_response",
            Self::InvalidEvent => "invalid_event",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for CalendarErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed calendar call or payload conversion.
#[derive(Debug, Error)]
pub struct CalendarError {
    code: CalendarErrorCode,
    message: String,
    /// Name of the [`crate::CalendarClient`] that failed, if any.
    client: Option<&'static str>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CalendarError {
    pub fn new(code: CalendarErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            client: None,
            source: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::Transient, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::Rejected, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::InvalidResponse, message)
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::InvalidEvent, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(CalendarErrorCode::Configuration, message)
    }

    /// Tags the error with the failing client's name.
    pub fn with_client(mut self, client: &'static str) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> CalendarErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn client(&self) -> Option<&str> {
        self.client
    }

    /// Returns true if the same call may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        self.code == CalendarErrorCode::Transient
    }
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client {
            Some(client) => write!(f, "[{}] {}: {}", client, self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

pub type CalendarResult<T> = Result<T, CalendarError>;
