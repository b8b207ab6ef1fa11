//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/ttcsync/config.toml` by default:
//!
//! ```toml
//! dry_run = false
//!
//! [calendar]
//! calendar_id = "closures@group.calendar.google.com"
//! time_zone = "America/Toronto"
//! access_token = "env::TTCSYNC_ACCESS_TOKEN"
//!
//! [source]
//! landing_page_url = "https://www.ttc.ca/service-advisories/subway-service"
//! timeout_secs = 30
//! max_attempts = 3
//! ```
//!
//! `access_token` supports secret references (see [`crate::secret`]). When
//! it is absent the token is read from `token_path`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ttcsync_advisories::{
    AdvisoryMarkup, DEFAULT_HOST_PREFIX, DEFAULT_LANDING_PAGE_URL, SourceConfig,
};
use ttcsync_calendar::{AccessToken, DEFAULT_TIME_ZONE, SyncConfig};
use ttcsync_core::RetryPolicy;
use url::Url;

/// Configuration for the ttcsync client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Log payloads instead of inserting them.
    pub dry_run: bool,

    /// Destination calendar settings.
    pub calendar: CalendarSettings,

    /// Advisory source settings.
    pub source: SourceSettings,
}

/// Destination calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Calendar to write events into.
    pub calendar_id: String,

    /// Time zone of night-only events.
    pub time_zone: String,

    /// Access token (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// JSON file holding the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Attempts for listing existing events.
    pub max_attempts: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            calendar_id: "primary".to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            access_token: None,
            token_path: None,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

/// Advisory source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Advisory listing page holding the search widget.
    pub landing_page_url: String,

    /// Prefix for relative advisory links.
    pub host_prefix: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Attempts per request.
    pub max_attempts: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            landing_page_url: DEFAULT_LANDING_PAGE_URL.to_string(),
            host_prefix: DEFAULT_HOST_PREFIX.to_string(),
            timeout_secs: SourceConfig::DEFAULT_TIMEOUT_SECS,
            max_attempts: 3,
        }
    }
}

impl SourceSettings {
    /// Converts to HTTP source configuration.
    pub fn to_source_config(&self) -> SourceConfig {
        SourceConfig {
            landing_page_url: self.landing_page_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy::default().with_max_attempts(self.max_attempts),
            ..SourceConfig::default()
        }
    }

    /// Returns the markup adapter with the configured host prefix.
    pub fn markup(&self) -> AdvisoryMarkup {
        AdvisoryMarkup::ttc_v1().with_host_prefix(self.host_prefix.as_str())
    }
}

impl CalendarSettings {
    /// Converts to sync configuration.
    pub fn to_sync_config(&self, dry_run: bool) -> SyncConfig {
        SyncConfig::new(&self.calendar_id)
            .with_time_zone(&self.time_zone)
            .with_dry_run(dry_run)
            .with_list_retry(RetryPolicy::default().with_max_attempts(self.max_attempts))
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolves the access token.
    ///
    /// An inline `access_token` wins over `token_path`. Inline values are
    /// passed through `secret::resolve()` to expand `pass::` and `env::`
    /// references.
    pub fn resolve_access_token(&self) -> Result<String, String> {
        if let Some(ref raw) = self.access_token {
            let token = crate::secret::resolve(raw)
                .map_err(|e| format!("failed to resolve access_token: {}", e))?;
            if token.trim().is_empty() {
                return Err("access_token is empty".to_string());
            }
            return Ok(token);
        }

        if let Some(ref path) = self.token_path {
            return AccessToken::load(path)
                .map(|token| token.access_token)
                .map_err(|e| e.to_string());
        }

        Err(format!(
            "no calendar access token. Add to {}:\n  \
             [calendar]\n  \
             access_token = \"env::TTCSYNC_ACCESS_TOKEN\"\n\n  \
             or point token_path at a JSON file with an access_token field",
            ClientConfig::default_path().display()
        ))
    }

    /// Checks settings that do not need the network.
    pub fn validate(&self) -> Result<(), String> {
        if self.calendar_id.trim().is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }
        if self.time_zone.trim().is_empty() {
            return Err("time_zone must not be empty".to_string());
        }
        if self.max_attempts == 0 {
            return Err("calendar max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ttcsync")
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), String> {
        self.calendar.validate()?;

        validate_http_url("landing_page_url", &self.source.landing_page_url)?;
        validate_http_url("host_prefix", &self.source.host_prefix)?;
        if self.source.max_attempts == 0 {
            return Err("source max_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("invalid {} '{}': {}", field, value, e))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("{} must use http or https, got '{}'", field, scheme)),
    }
}
