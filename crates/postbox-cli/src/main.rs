//! postbox CLI - send contact messages from the terminal
//!
//! Every message is cached locally before the collector is contacted, so a
//! send succeeds even when the collector is down.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::{read_message, resolve_config};
use crate::commands::completions::run_completions;
use crate::commands::inbox::run_inbox;
use crate::commands::outbox::run_outbox;
use crate::commands::send::run_send;
use crate::commands::sync::run_sync;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("postbox=warn".parse().map_err(|_| {
                    CliError::Config("invalid default log directive".to_string())
                })?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = resolve_config(cli.collector_url.clone(), cli.data_dir.clone())?;
    tracing::debug!(?config, "Resolved client configuration");

    match cli.command {
        Commands::Send {
            name,
            email,
            subject,
            message,
            json,
        } => {
            let message = read_message(message)?;
            run_send(&name, &email, &subject, &message, json, &config).await?;
        }
        Commands::Outbox { pending, json } => run_outbox(pending, json, &config).await?,
        Commands::Sync { json } => run_sync(json, &config).await?,
        Commands::Watch { interval } => run_watch(interval, &config).await?,
        Commands::Inbox { limit, json } => run_inbox(limit, json, &config).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
