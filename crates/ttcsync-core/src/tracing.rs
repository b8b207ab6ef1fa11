//! Logging setup for the `ttcsync` binary.
//!
//! Logs always go to stderr: `ttcsync advisories` prints JSON on stdout and
//! must stay pipeable. `RUST_LOG` overrides the level picked from the flags.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// A subscriber was already installed
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter built from the level was rejected
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Line format of log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One human-readable line per record
    #[default]
    Compact,
    /// JSON lines for cron and CI logs
    Json,
}

/// Logging settings derived from the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for the workspace crates when RUST_LOG is unset
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Prefix records with a timestamp
    pub timestamps: bool,
    /// Add file and line to each record
    pub locations: bool,
}

impl Default for TracingConfig {
    /// Quiet terminal output: warnings and errors only.
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: TracingOutputFormat::Compact,
            timestamps: false,
            locations: false,
        }
    }
}

impl TracingConfig {
    /// Verbose terminal output for `--debug`.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: Level::DEBUG,
            locations: true,
            ..Self::default()
        }
    }

    /// JSON lines with timestamps for `--json-logs`.
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Json,
            timestamps: true,
            locations: true,
        }
    }

    /// Picks the preset for the `--debug` and `--json-logs` flags.
    ///
    /// `--debug` keeps JSON output when both are given, at debug level.
    #[must_use]
    pub fn from_flags(debug: bool, json_logs: bool) -> Self {
        match (debug, json_logs) {
            (true, true) => Self {
                level: Level::DEBUG,
                ..Self::unattended()
            },
            (true, false) => Self::debug(),
            (false, true) => Self::unattended(),
            (false, false) => Self::default(),
        }
    }

    /// Filter used when `RUST_LOG` is unset: the workspace crates at
    /// `level`, dependencies at warn.
    fn default_directive(&self) -> String {
        let mut directive = String::from("warn");
        for target in CRATE_TARGETS {
            directive.push_str(&format!(",{}={}", target, self.level));
        }
        directive
    }
}

/// Tracing targets of the workspace crates.
const CRATE_TARGETS: &[&str] = &[
    "ttcsync",
    "ttcsync_core",
    "ttcsync_advisories",
    "ttcsync_calendar",
    "ttcsync_cli",
];

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directive())?,
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.locations)
        .with_line_number(config.locations);

    let layer = match (config.format, config.timestamps) {
        (TracingOutputFormat::Json, true) => layer.json().boxed(),
        (TracingOutputFormat::Json, false) => layer.json().without_time().boxed(),
        (TracingOutputFormat::Compact, true) => layer.compact().boxed(),
        (TracingOutputFormat::Compact, false) => layer.compact().without_time().boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_by_default() {
        let config = TracingConfig::from_flags(false, false);
        assert_eq!(config, TracingConfig::default());
        assert_eq!(config.level, Level::WARN);
        assert!(!config.timestamps);
    }

    #[test]
    fn debug_flag() {
        let config = TracingConfig::from_flags(true, false);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingOutputFormat::Compact);
        assert!(config.locations);
    }

    #[test]
    fn json_logs_flag() {
        let config = TracingConfig::from_flags(false, true);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, TracingOutputFormat::Json);
        assert!(config.timestamps);
    }

    #[test]
    fn debug_and_json_logs() {
        let config = TracingConfig::from_flags(true, true);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingOutputFormat::Json);
    }

    #[test]
    fn default_directive_covers_crates() {
        let directive = TracingConfig::debug().default_directive();
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("ttcsync_advisories=DEBUG"));
        assert!(directive.contains("ttcsync_calendar=DEBUG"));
        EnvFilter::try_new(&directive).unwrap();
    }
}
