//! ttcsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use ttcsync_cli::cli::{Cli, Command, ConfigAction};
use ttcsync_cli::commands;
use ttcsync_cli::config::ClientConfig;
use ttcsync_cli::error::{ClientError, ClientResult};
use ttcsync_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::from_flags(cli.debug, cli.json_logs)) {
        eprintln!("error: {}", ClientError::from(e));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);

    let mut config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };

    if let Some(calendar_id) = cli.calendar_id {
        config.calendar.calendar_id = calendar_id;
    }
    config.dry_run |= cli.dry_run;

    match cli.command.unwrap_or(Command::Sync) {
        Command::Sync => commands::sync::sync(&config, cli.offline).await.map(|_| ()),
        Command::Advisories => commands::sync::advisories(&config, cli.offline).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config, cli.offline),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
