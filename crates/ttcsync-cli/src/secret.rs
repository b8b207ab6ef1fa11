//! Secret references.
//!
//! The calendar access token in `config.toml` may point at a secret kept
//! outside the file:
//!
//! - `pass::path/in/store` - first line of `pass show path/in/store`
//! - `env::VAR_NAME` - value of `$VAR_NAME`
//! - anything else - the literal value

use std::process::Command;

use thiserror::Error;

/// A parsed secret reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// An entry of the `pass` password store.
    Pass(&'a str),
    /// An environment variable.
    Env(&'a str),
    /// A literal value.
    Plain(&'a str),
}

/// Failure to resolve a secret reference.
#[derive(Debug, Error)]
pub enum SecretError {
    /// `pass` could not be started.
    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `pass` ran but failed.
    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// `pass` printed nothing.
    #[error("`pass show {path}` produced no output")]
    PassEmpty { path: String },

    /// The environment variable is unset or not unicode.
    #[error("environment variable `{0}` is not set")]
    EnvMissing(String),
}

impl<'a> SecretRef<'a> {
    /// Parses a configured value.
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Resolves the reference to the secret value.
    pub fn resolve(self) -> Result<String, SecretError> {
        match self {
            Self::Pass(path) => resolve_pass(path),
            Self::Env(var) => {
                std::env::var(var).map_err(|_| SecretError::EnvMissing(var.to_string()))
            }
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Parses and resolves a configured value.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    SecretRef::parse(value).resolve()
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty {
            path: path.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixes() {
        assert_eq!(SecretRef::parse("pass::google/ttcsync"), SecretRef::Pass("google/ttcsync"));
        assert_eq!(SecretRef::parse("env::TTCSYNC_TOKEN"), SecretRef::Env("TTCSYNC_TOKEN"));
        assert_eq!(SecretRef::parse("ya29.a0Af"), SecretRef::Plain("ya29.a0Af"));
        assert_eq!(SecretRef::parse("env:single-colon"), SecretRef::Plain("env:single-colon"));
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("ya29.token").unwrap(), "ya29.token");
        assert_eq!(resolve("").unwrap(), "");
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_TTCSYNC_TEST_SECRET", "token-from-env");
        }
        assert_eq!(resolve("env::_TTCSYNC_TEST_SECRET").unwrap(), "token-from-env");
        unsafe {
            std::env::remove_var("_TTCSYNC_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_TTCSYNC_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(matches!(err, SecretError::EnvMissing(_)));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_prefix_unknown_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::nonexistent/ttcsync/entry/12345").is_err());
    }
}
