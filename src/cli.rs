//! CLI commands for tennis-odds-harvester.
//!
//! Supports scheduled harvesting, single cycles, catalog inspection and
//! offline replay of archived captures.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::pipeline::{normalize_captures, CycleSummary, Harvester};
use crate::scheduler::run_schedule;
use crate::scraper::archive::CaptureArchive;
use crate::scraper::{CatalogResolver, Normalizer};
use crate::types::{NormalizedMatchRecord, Tournament};

#[derive(Parser)]
#[command(name = "tennis-odds-harvester")]
#[command(version, about = "Tennis odds harvester: captures sportsbook odds and republishes them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run cycles on a schedule until interrupted
    Run {
        /// Run a cycle immediately instead of waiting for the first interval
        #[arg(long)]
        run_now: bool,

        /// Interval override in minutes
        #[arg(short, long)]
        interval_minutes: Option<u64>,
    },

    /// Run a single cycle
    Once {
        /// Capture and normalize but do not upload
        #[arg(long)]
        dry_run: bool,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Resolve and print this cycle's tournaments
    Catalog {
        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Normalize archived captures without a browser
    Replay {
        /// Archive files written by a previous cycle
        #[arg(value_name = "FILE", required_unless_present = "tournament")]
        files: Vec<PathBuf>,

        /// Tournament ids to load from the configured archive directory
        #[arg(short, long, value_delimiter = ',')]
        tournament: Vec<u64>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

/// Run the scheduler until Ctrl+C.
pub async fn run_scheduled(run_now: bool, interval_minutes: Option<u64>) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if run_now {
        config.schedule.run_on_startup = true;
    }
    if let Some(minutes) = interval_minutes {
        config.schedule.interval_minutes = minutes;
    }

    let harvester = Harvester::new(&config)?;
    run_schedule(
        &config.schedule,
        || harvester.run_cycle(false),
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await;

    harvester.shutdown().await;
    Ok(())
}

/// Run one cycle and print its outcome.
pub async fn run_once(dry_run: bool, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let harvester = Harvester::new(&config)?;

    let result = harvester.run_cycle(dry_run).await;
    harvester.shutdown().await;
    let summary = result?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary.records)?),
        "table" => print_summary(&summary),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_summary(&summary);
        }
    }
    Ok(())
}

/// Resolve the catalog and print the tournaments that would be captured.
pub async fn run_catalog(format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let resolver = CatalogResolver::new(&config.source, &config.catalog, &config.browser)?;
    let tournaments = resolver.resolve().await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&tournaments)?),
        _ => print_tournaments(&tournaments),
    }
    Ok(())
}

/// Normalize archived captures and print the records.
pub async fn run_replay(files: Vec<PathBuf>, ids: Vec<u64>, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let normalizer = Normalizer::new(&config.source.sport_label, &config.source.id_prefix);
    let archive = CaptureArchive::from_config(&config.archive);

    let mut entries = Vec::new();
    for path in &files {
        entries.push(CaptureArchive::read_file(path)?);
    }
    for id in ids {
        match archive.get(id) {
            Some(entry) => entries.push(entry),
            None => eprintln!("No unexpired archive entry for tournament {}", id),
        }
    }

    let mut tournaments = Vec::new();
    let mut payloads = std::collections::BTreeMap::new();
    for entry in entries {
        eprintln!(
            "Loaded {} payload(s) for {} captured at {}",
            entry.payloads.len(),
            entry.tournament.name,
            entry.captured_at
        );
        payloads
            .entry(entry.tournament.id)
            .or_insert_with(Vec::new)
            .extend(entry.payloads);
        if !tournaments.iter().any(|t: &Tournament| t.id == entry.tournament.id) {
            tournaments.push(entry.tournament);
        }
    }

    let records = normalize_captures(&normalizer, &tournaments, &payloads, Utc::now());
    match format.as_str() {
        "table" => print_records(&records),
        _ => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn print_tournaments(tournaments: &[Tournament]) {
    println!("=== Tournaments ({}) ===", tournaments.len());
    for t in tournaments {
        println!("  {:>10}  {}", t.id, t.name);
    }
}

fn print_records(records: &[NormalizedMatchRecord]) {
    println!("=== Records ({}) ===", records.len());
    for r in records {
        println!(
            "  {}  {} vs {}  [{}]  ML {}/{}  SP {}/{}  TOT {}/{}",
            r.start_time.format("%Y-%m-%d %H:%M"),
            r.home_team.name,
            r.away_team.name,
            r.league,
            fmt_opt(r.moneyline_home),
            fmt_opt(r.moneyline_away),
            fmt_opt(r.spread_home),
            fmt_opt(r.spread_away),
            fmt_opt(r.total_over),
            fmt_opt(r.total_under),
        );
    }
}

fn print_summary(summary: &CycleSummary) {
    println!("Cycle started: {}", summary.started_at.to_rfc3339());
    println!();
    print_tournaments(&summary.tournaments);
    println!(
        "Captured: {}/{} tournament(s), {} payload(s)",
        summary.captured,
        summary.tournaments.len(),
        summary.payloads
    );
    println!();
    print_records(&summary.records);
    println!();
    match &summary.receipt {
        Some(receipt) => println!(
            "Upload: {} processed at {}",
            receipt
                .processed
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string()),
            receipt.timestamp.as_deref().unwrap_or("?")
        ),
        None => println!("Upload: skipped"),
    }
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["tennis-odds-harvester", "run", "--run-now", "-i", "15"]);
        assert!(matches!(
            cli.command,
            Commands::Run {
                run_now: true,
                interval_minutes: Some(15)
            }
        ));

        let cli = Cli::parse_from(["tennis-odds-harvester", "once", "--dry-run", "-f", "json"]);
        assert!(matches!(cli.command, Commands::Once { dry_run: true, ref format } if format == "json"));

        assert!(Cli::try_parse_from(["tennis-odds-harvester", "replay"]).is_err());
        let cli = Cli::parse_from(["tennis-odds-harvester", "replay", "-t", "12345,12346"]);
        assert!(matches!(cli.command, Commands::Replay { ref tournament, .. } if tournament == &[12345, 12346]));
    }

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(-150)), "-150");
        assert_eq!(fmt_opt::<f64>(None), "-");
    }
}
