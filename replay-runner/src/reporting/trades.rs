//! Trade ledger export (CSV).

use anyhow::{Context, Result};
use replay_core::domain::LedgerEntry;
use replay_core::symbols::SymbolCatalog;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_trades_csv(
    path: &Path,
    trades: &[LedgerEntry],
    catalog: Option<&SymbolCatalog>,
) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;

    writeln!(
        file,
        "date,security,symbol,quantity,side,cash_delta,price,adj_price,annotation"
    )?;

    for trade in trades {
        let symbol = catalog
            .and_then(|c| c.symbol(trade.security))
            .unwrap_or("");
        writeln!(
            file,
            "{},{},{},{},{},{:.4},{:.4},{:.4},{}",
            trade.date,
            trade.security,
            symbol,
            trade.quantity,
            trade.side.as_str(),
            trade.cash_delta,
            trade.price,
            trade.adj_price,
            trade.annotation
        )?;
    }

    Ok(())
}
