//! Interaction bot - signed webhook endpoint plus command management.

mod app;
mod cli;
mod commands;
mod image_client;

use bot_config::{init_logging, RunMode};
use clap::Parser;
use cli::Cli;
use command_registry::SyncMode;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config();

    init_logging(&config.log_level, &config.log_format, &config.bot_name);
    config.validate()?;

    match config.mode() {
        RunMode::Serve => app::run_server(config).await?,
        RunMode::InstallCommands => app::sync_commands(&config, SyncMode::Install).await?,
        RunMode::TeardownCommands => app::sync_commands(&config, SyncMode::Teardown).await?,
    }

    Ok(())
}
