//! Serializable session configuration (TOML).

use crate::driver::CutoffPolicy;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_lot_size() -> u64 {
    replay_core::account::DEFAULT_LOT_SIZE
}

fn default_cutoff() -> String {
    "16:30".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub capital: f64,
    pub fee_rate: f64,
}

/// One replay session: where the data lives, who trades, how days are gated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory of per-date quote CSV files.
    pub data_dir: PathBuf,
    /// Optional directory of per-date benchmark-index CSV files.
    pub benchmark_dir: Option<PathBuf>,
    /// Symbol universe; ids are interned in this order.
    pub symbols: Vec<String>,
    /// Benchmark index symbol (interned into the benchmark feed's catalog).
    pub benchmark_symbol: Option<String>,
    pub checkpoint_dir: PathBuf,
    pub report_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    /// Seed date; the first advance moves strictly past it.
    pub start_date: NaiveDate,
    pub accounts: Vec<AccountConfig>,
    #[serde(default = "default_lot_size")]
    pub lot_size: u64,
    /// Daily settlement cutoff, `HH:MM`.
    #[serde(default = "default_cutoff")]
    pub cutoff: String,
    pub policy: CutoffPolicy,
}

impl RunConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Parse the cutoff string; an unrecognized value is a configuration
    /// error, surfaced instead of silently defaulted.
    pub fn cutoff_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.cutoff, "%H:%M")
            .with_context(|| format!("unrecognized cutoff time {:?}", self.cutoff))
    }
}
