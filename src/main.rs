//! Tennis Odds Harvester
//!
//! Captures tennis odds from a sportsbook through a headless browser and
//! republishes them in a normalized schema.

mod cli;
mod config;
mod error;
mod pipeline;
mod publisher;
mod retry;
mod scheduler;
mod scraper;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tennis_odds_harvester=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run {
            run_now,
            interval_minutes,
        } => cli::run_scheduled(run_now, interval_minutes).await,
        Commands::Once { dry_run, format } => cli::run_once(dry_run, format).await,
        Commands::Catalog { format } => cli::run_catalog(format).await,
        Commands::Replay {
            files,
            tournament,
            format,
        } => cli::run_replay(files, tournament, format).await,
    }
}
