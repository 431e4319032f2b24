//! NAV history export (CSV), with the excess index alongside.

use crate::metrics::excess_index;
use anyhow::{Context, Result};
use replay_core::domain::NavPoint;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_nav_csv(path: &Path, nav_history: &[NavPoint]) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create NAV CSV {}", path.display()))?;

    writeln!(file, "date,benchmark,benchmark_return,nav,nav_return,excess_index")?;

    let excess = excess_index(nav_history);
    for (row, excess) in nav_history.iter().zip(excess) {
        writeln!(
            file,
            "{},{:.4},{:.6},{:.4},{:.6},{:.6}",
            row.date, row.benchmark, row.benchmark_return, row.nav, row.nav_return, excess
        )?;
    }

    Ok(())
}
