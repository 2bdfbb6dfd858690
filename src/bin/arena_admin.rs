use anyhow::{bail, Context, Result};
use arena_core::{RetentionOptions, SeasonId};
use arena_reconcile::{
    audit_schedule, load_boundaries, seed_seasons, AppConfig, Reconciler, RunMode,
};
use arena_store::{RocksBackend, ScheduleBackend};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arena_admin")]
#[command(about = "Arena schedule administration", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./arena.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory, overrides store.path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply corrected season boundaries and regenerate future rounds
    Reconcile {
        /// CSV with corrected season boundaries
        csv_path: PathBuf,

        /// Current block index; rounds up to the one containing it are kept
        #[arg(long = "current-block", short = 'b')]
        current_block: Option<u64>,

        /// Report the changes without applying them
        #[arg(long = "dry-run", short = 'd')]
        dry_run: bool,

        /// Exclude a season whose cursor matches no round instead of regenerating it
        #[arg(long)]
        strict_cursor: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create seasons from CSV and partition them into rounds
    Seed { csv_path: PathBuf },

    /// Check that every season's rounds tile its range
    Verify,

    /// List a season's rounds
    Rounds { season_id: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db) = cli.db {
        config.store.path = db;
    }
    let backend = RocksBackend::open(&config.store)
        .with_context(|| format!("opening store at {}", config.store.path.display()))?;

    match cli.command {
        Commands::Reconcile {
            csv_path,
            current_block,
            dry_run,
            strict_cursor,
            json,
        } => {
            let mode = if dry_run { RunMode::Preview } else { RunMode::Commit };
            let options = RetentionOptions {
                strict_cursor: strict_cursor || config.reconcile.strict_cursor,
            };
            info!(
                "{}Reconciling from {}",
                mode.log_prefix(),
                csv_path.display()
            );

            let batch = load_boundaries(&csv_path)
                .await
                .with_context(|| format!("reading {}", csv_path.display()))?;
            let report = Reconciler::new(&backend, options).run(&batch, current_block, mode);

            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{}", report);
            }
            if report.outcome.is_failure() {
                bail!("reconciliation {}", report.outcome.label());
            }
        }
        Commands::Seed { csv_path } => {
            let batch = load_boundaries(&csv_path)
                .await
                .with_context(|| format!("reading {}", csv_path.display()))?;
            for row in &batch.rejected {
                println!("Skipped line {}: {}", row.line, row.error);
            }
            let summary = seed_seasons(&backend, &batch)?;
            println!(
                "Seeded {} seasons with {} rounds ({} already present)",
                summary.created_seasons.len(),
                summary.rounds_created,
                summary.skipped_existing.len()
            );
        }
        Commands::Verify => {
            let audit = audit_schedule(&backend)?;
            for note in &audit.notes {
                println!(
                    "Season {}: short round [{}] kept before later rounds",
                    note.season_id, note.span
                );
            }
            if audit.is_clean() {
                println!("All seasons tile their block ranges");
            } else {
                for finding in &audit.findings {
                    println!("Season {}: {}", finding.season_id, finding.error);
                }
                bail!("{} seasons failed verification", audit.findings.len());
            }
        }
        Commands::Rounds { season_id } => {
            let rounds = backend.load_rounds(SeasonId(season_id))?;
            println!("{:>8} {:>6} {:>12} {:>12}", "round", "index", "start", "end");
            for round in rounds {
                println!(
                    "{:>8} {:>6} {:>12} {:>12}",
                    round.id, round.round_index, round.start_block, round.end_block
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_flags_parse() {
        let cli = Cli::try_parse_from([
            "arena_admin",
            "--db",
            "/tmp/arena",
            "reconcile",
            "seasons.csv",
            "-b",
            "250",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("/tmp/arena")));
        match cli.command {
            Commands::Reconcile {
                csv_path,
                current_block,
                dry_run,
                strict_cursor,
                json,
            } => {
                assert_eq!(csv_path, PathBuf::from("seasons.csv"));
                assert_eq!(current_block, Some(250));
                assert!(dry_run);
                assert!(!strict_cursor);
                assert!(!json);
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn test_reconcile_requires_csv_path() {
        assert!(Cli::try_parse_from(["arena_admin", "reconcile"]).is_err());
    }

    #[test]
    fn test_rounds_takes_season_id() {
        let cli = Cli::try_parse_from(["arena_admin", "rounds", "7"]).unwrap();
        assert!(matches!(cli.command, Commands::Rounds { season_id: 7 }));
    }
}
