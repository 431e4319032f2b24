//! Export orchestrator: all artifacts for one account under one directory.

use crate::metrics::PerformanceSummary;
use crate::reporting::{nav, summary, trades};
use anyhow::Result;
use replay_core::account::Account;
use replay_core::symbols::SymbolCatalog;
use std::path::{Path, PathBuf};

/// Where one account's artifacts landed.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// Account never traded: a single placeholder file is written so the
    /// absence is visible in the output directory.
    NoData { placeholder: PathBuf },
    Written {
        trades: PathBuf,
        nav: PathBuf,
        summary: PathBuf,
    },
}

pub fn export_account(
    output_dir: impl AsRef<Path>,
    label: &str,
    account: &Account,
    catalog: Option<&SymbolCatalog>,
) -> Result<ExportOutcome> {
    let dir = output_dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let Some(perf) = PerformanceSummary::compute(&account.nav_history) else {
        let placeholder = dir.join(format!("{label} - No data to save.csv"));
        std::fs::write(&placeholder, "No data to save\n")?;
        return Ok(ExportOutcome::NoData { placeholder });
    };

    let trades_path = dir.join(format!("trades {label}.csv"));
    let nav_path = dir.join(format!("nav {label}.csv"));
    let summary_path = dir.join(format!("summary {label}.csv"));

    trades::write_trades_csv(&trades_path, &account.ledger, catalog)?;
    nav::write_nav_csv(&nav_path, &account.nav_history)?;
    summary::write_summary_csv(&summary_path, &perf)?;

    Ok(ExportOutcome::Written {
        trades: trades_path,
        nav: nav_path,
        summary: summary_path,
    })
}
