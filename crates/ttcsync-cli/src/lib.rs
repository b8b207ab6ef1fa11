//! CLI and configuration for ttcsync
//!
//! This crate provides the `ttcsync` command-line interface: it loads the
//! TOML configuration, wires the advisory source and the calendar client,
//! and runs the pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
