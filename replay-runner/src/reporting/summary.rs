//! Performance summary export (CSV).

use crate::metrics::PerformanceSummary;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_summary_csv(path: &Path, summary: &PerformanceSummary) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create summary CSV {}", path.display()))?;

    writeln!(file, "total_return,{:.6}", summary.total_return)?;
    writeln!(file, "annualized_return,{:.6}", summary.annualized_return)?;
    writeln!(
        file,
        "annualized_volatility,{:.6}",
        summary.annualized_volatility
    )?;
    match summary.sharpe {
        Some(sharpe) => writeln!(file, "sharpe,{sharpe:.6}")?,
        None => writeln!(file, "sharpe,undefined")?,
    }

    Ok(())
}
