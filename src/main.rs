//! CLI entry point for bookmark-sync.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;
mod progress;

use cli::{AuthCommand, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level(cli.verbose, cli.quiet)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "CLI arguments parsed");

    let state_path = cli.state.as_deref();
    match &cli.command {
        Command::Sync(args) => commands::run_sync_command(args, state_path, cli.quiet).await,
        Command::RebuildIndex(vault) => commands::run_rebuild_index_command(vault, state_path).await,
        Command::Auth { command } => match command {
            AuthCommand::Login(args) => commands::run_auth_login_command(args, state_path).await,
            AuthCommand::Logout => commands::run_auth_logout_command(state_path).await,
        },
        Command::Status => commands::run_status_command(state_path).await,
        Command::Config { command } => match command {
            ConfigCommand::Show => commands::run_config_show_command(state_path).await,
            ConfigCommand::Set { key, value } => {
                commands::run_config_set_command(key, value, state_path).await
            }
        },
    }
}

fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
