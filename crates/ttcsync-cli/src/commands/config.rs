//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Output(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration, including the access token unless offline.
pub fn validate(config: &ClientConfig, offline: bool) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    if !offline {
        config
            .calendar
            .resolve_access_token()
            .map_err(|e| ClientError::Config(format!("invalid calendar access token: {}", e)))?;
        println!("Calendar access token resolved.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
