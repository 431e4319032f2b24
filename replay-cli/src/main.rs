//! Replay CLI — run, report, and checkpoint management commands.
//!
//! Commands:
//! - `run` — execute a replay session from a TOML config file
//! - `report` — regenerate report artifacts from the latest checkpoint
//! - `checkpoints` — list committed checkpoints for a session

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use replay_core::account::Account;
use replay_core::calendar::SliceCalendar;
use replay_core::checkpoint::{CheckpointStore, DirCheckpointStore};
use replay_core::clock::Clock;
use replay_core::feed::DirFeed;
use replay_core::symbols::SymbolCatalog;
use replay_runner::driver::{resume_or_init, run_session, SessionReport, StopReason, SystemWallClock};
use replay_runner::metrics::PerformanceSummary;
use replay_runner::reporting::{export_account, ExportOutcome};
use replay_runner::RunConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "replay", about = "Replay CLI — daily market replay engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a replay session from a TOML config file.
    ///
    /// Resumes from the newest committed checkpoint if one exists, runs
    /// trading days until the calendar is exhausted or the cutoff gate
    /// aborts, then writes report artifacts for every account.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Regenerate report artifacts from the latest checkpoint, without
    /// running any trading day.
    Report {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// List committed checkpoints for a session.
    Checkpoints {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_cmd(&config),
        Commands::Report { config } => report_cmd(&config),
        Commands::Checkpoints { config } => checkpoints_cmd(&config),
    }
}

fn run_cmd(config_path: &Path) -> Result<()> {
    let config = RunConfig::from_path(config_path)?;
    let cutoff = config.cutoff_time()?;
    let calendar = calendar_from_data_dir(&config.data_dir)?;
    let store = DirCheckpointStore::new(&config.checkpoint_dir);

    let mut clock = resume_or_init(&store, || build_clock(&config))?;
    let wall = SystemWallClock;
    let report = run_session(&mut clock, &calendar, &store, config.policy, cutoff, &wall)?;

    print_session(&report, &clock);
    export_all(&config, &clock)
}

fn report_cmd(config_path: &Path) -> Result<()> {
    let config = RunConfig::from_path(config_path)?;
    let store = DirCheckpointStore::new(&config.checkpoint_dir);

    let clock = resume_or_init(&store, || build_clock(&config))?;
    export_all(&config, &clock)
}

fn checkpoints_cmd(config_path: &Path) -> Result<()> {
    let config = RunConfig::from_path(config_path)?;
    let store = DirCheckpointStore::new(&config.checkpoint_dir);

    let keys = store.list_committed_keys()?;
    if keys.is_empty() {
        println!("No committed checkpoints in {}", config.checkpoint_dir.display());
        return Ok(());
    }
    println!("Checkpoints in {}:", config.checkpoint_dir.display());
    for date in keys {
        println!("  {date}");
    }
    Ok(())
}

/// Assemble the clock graph a fresh session starts from. Also called before
/// a resume: feeds and the day log are external resources a checkpoint never
/// carries, so they are rebuilt here either way.
fn build_clock(config: &RunConfig) -> Clock {
    let mut clock = Clock::new(config.start_date);

    let catalog = Arc::new(SymbolCatalog::from_symbols(
        config.symbols.iter().map(String::as_str),
    ));
    clock.add_feed(Box::new(DirFeed::new(
        "quotes",
        &config.data_dir,
        catalog,
    )));

    if let (Some(dir), Some(symbol)) = (&config.benchmark_dir, &config.benchmark_symbol) {
        let index_catalog = Arc::new(SymbolCatalog::from_symbols([symbol.as_str()]));
        clock.add_feed(Box::new(
            DirFeed::new("benchmark", dir, index_catalog).into_benchmark(),
        ));
    }

    for account in &config.accounts {
        clock.add_account(
            Account::new(&account.id, account.capital, account.fee_rate)
                .with_lot_size(config.lot_size),
        );
    }

    if let Some(log_dir) = &config.log_dir {
        if let Err(e) = clock.attach_day_log(log_dir) {
            eprintln!("Warning: day log unavailable ({e}); continuing without it");
        }
    }

    clock
}

/// The trading calendar is implied by the data itself: one `YYYY-MM-DD.csv`
/// per trading date under the quote directory.
fn calendar_from_data_dir(data_dir: &Path) -> Result<SliceCalendar> {
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;

    let mut dates = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = name.strip_suffix(".csv") else {
            continue;
        };
        if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
            dates.push(date);
        }
    }
    if dates.is_empty() {
        bail!(
            "no dated quote files (YYYY-MM-DD.csv) found in {}",
            data_dir.display()
        );
    }
    Ok(SliceCalendar::new(dates))
}

fn export_all(config: &RunConfig, clock: &Clock) -> Result<()> {
    let catalog = SymbolCatalog::from_symbols(config.symbols.iter().map(String::as_str));
    for account in clock.accounts() {
        print_account(account);
        match export_account(&config.report_dir, &account.id, account, Some(&catalog))? {
            ExportOutcome::NoData { placeholder } => {
                println!("  No trades; wrote {}", placeholder.display());
            }
            ExportOutcome::Written { trades, nav, summary } => {
                println!("  Trades:  {}", trades.display());
                println!("  NAV:     {}", nav.display());
                println!("  Summary: {}", summary.display());
            }
        }
    }
    Ok(())
}

fn print_session(report: &SessionReport, clock: &Clock) {
    println!();
    println!("=== Session ===");
    println!("Days run:       {}", report.days_run);
    println!("Last date:      {}", clock.current_date());
    match report.stop_reason {
        StopReason::CalendarExhausted => println!("Stopped:        calendar exhausted"),
        StopReason::CutoffNotReached => println!("Stopped:        today's cutoff not reached yet"),
    }
}

fn print_account(account: &Account) {
    println!();
    println!("--- Account {} ---", account.id);
    println!("  Cash:         {:.2}", account.cash);
    println!("  NAV:          {:.2}", account.nav);
    println!("  Held:         {} securities", account.held_count());
    println!("  Trades:       {}", account.ledger.len());
    if let Some(perf) = PerformanceSummary::compute(&account.nav_history) {
        println!("  Total Return: {:.2}%", perf.total_return * 100.0);
        println!("  Ann. Return:  {:.2}%", perf.annualized_return * 100.0);
        println!("  Ann. Vol:     {:.2}%", perf.annualized_volatility * 100.0);
        match perf.sharpe {
            Some(sharpe) => println!("  Sharpe:       {sharpe:.3}"),
            None => println!("  Sharpe:       undefined (zero volatility)"),
        }
    }
}
