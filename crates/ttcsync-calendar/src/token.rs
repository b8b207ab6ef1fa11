//! Access token files.
//!
//! Authorization happens outside this program. The resulting access token is
//! either handed over directly in the configuration, or stored as JSON in a
//! token file:
//!
//! ```json
//! { "access_token": "ya29...", "expires_at": "2022-03-07T12:00:00Z" }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};

/// A previously issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The bearer token for API requests.
    pub access_token: String,

    /// When the token expires, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token without a known expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Returns true if the token is past its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Loads a token from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed,
    /// holds an empty token, or the token has expired.
    pub fn load(path: &Path) -> CalendarResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CalendarError::configuration(format!(
                "failed to read token file {}: {}",
                path.display(),
                e
            ))
        })?;

        let token: AccessToken = serde_json::from_str(&content).map_err(|e| {
            CalendarError::configuration(format!(
                "failed to parse token file {}: {}",
                path.display(),
                e
            ))
        })?;

        if token.access_token.trim().is_empty() {
            return Err(CalendarError::configuration(format!(
                "token file {} has an empty access_token",
                path.display()
            )));
        }

        if token.is_expired() {
            return Err(CalendarError::configuration(format!(
                "access token in {} expired",
                path.display()
            )));
        }

        debug!("loaded access token from {:?}", path);
        Ok(token)
    }
}
