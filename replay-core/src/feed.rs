//! Price feed trait and the two built-in sources.
//!
//! A feed owns a per-day cache of at most one [`PriceRecord`] per security.
//! The clock clears every feed before the open and pulls fresh data after the
//! close; strategy hooks and the matching engine only ever read the cache.
//! Feed[0] on the clock is the canonical quote source for matching; a feed
//! flagged as benchmark supplies the index series.

use crate::domain::{PriceRecord, SecurityId};
use crate::symbols::SymbolCatalog;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Structured errors for feed operations.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("i/o error reading feed data: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed feed file {file}: {reason}")]
    Malformed { file: String, reason: String },
}

/// Read-only access to the current day's cached quotes.
///
/// Split out from [`PriceFeed`] so the matching engine and valuation can be
/// handed just the lookup capability (and tests can stub it with a map).
pub trait QuoteSource {
    fn quote(&self, security: SecurityId) -> Option<&PriceRecord>;
}

/// A daily market-data source owned by the clock.
pub trait PriceFeed: QuoteSource {
    /// Human-readable label for logs and diagnostics.
    fn label(&self) -> &str;

    /// Whether this feed supplies the benchmark index series.
    fn is_benchmark(&self) -> bool {
        false
    }

    /// Refresh the per-day cache for `date`. `Ok(false)` means the source has
    /// no data for that date; the cache is left cleared.
    fn pull(&mut self, date: NaiveDate) -> Result<bool, FeedError>;

    /// First populated record in the cache. Benchmark feeds track a single
    /// index series, so this is their quote for the day.
    fn first_quote(&self) -> Option<&PriceRecord>;

    /// Drop all cached records.
    fn clear(&mut self);
}

/// A plain slab of per-security slots is itself a quote source; feeds use
/// this for their caches and tests use it as a stub.
impl QuoteSource for Vec<Option<PriceRecord>> {
    fn quote(&self, security: SecurityId) -> Option<&PriceRecord> {
        self.get(security.index()).and_then(Option::as_ref)
    }
}

// ─── In-memory feed ─────────────────────────────────────────────────

/// Preloaded feed, used by tests and synthetic runs.
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    label: String,
    benchmark: bool,
    by_date: BTreeMap<NaiveDate, Vec<PriceRecord>>,
    cache: Vec<Option<PriceRecord>>,
}

impl MemoryFeed {
    pub fn new(label: impl Into<String>, universe: usize) -> Self {
        Self {
            label: label.into(),
            benchmark: false,
            by_date: BTreeMap::new(),
            cache: vec![None; universe],
        }
    }

    pub fn benchmark(label: impl Into<String>, universe: usize) -> Self {
        Self {
            benchmark: true,
            ..Self::new(label, universe)
        }
    }

    /// Stage a record to be served when its date is pulled.
    pub fn push(&mut self, record: PriceRecord) {
        self.by_date.entry(record.date).or_default().push(record);
    }
}

impl QuoteSource for MemoryFeed {
    fn quote(&self, security: SecurityId) -> Option<&PriceRecord> {
        self.cache.quote(security)
    }
}

impl PriceFeed for MemoryFeed {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_benchmark(&self) -> bool {
        self.benchmark
    }

    fn pull(&mut self, date: NaiveDate) -> Result<bool, FeedError> {
        self.clear();
        let Some(records) = self.by_date.get(&date) else {
            return Ok(false);
        };
        for record in records {
            let slot = record.security.index();
            if slot >= self.cache.len() {
                self.cache.resize(slot + 1, None);
            }
            self.cache[slot] = Some(record.clone());
        }
        Ok(true)
    }

    fn first_quote(&self) -> Option<&PriceRecord> {
        self.cache.iter().flatten().next()
    }

    fn clear(&mut self) {
        self.cache.iter_mut().for_each(|slot| *slot = None);
    }
}

// ─── Directory-of-CSV feed ──────────────────────────────────────────

/// Feed reading one `YYYY-MM-DD.csv` file per trading date.
///
/// Expected columns: `symbol,close,adj_close,adj_return,open,adj_open`
/// followed by any number of numeric extension columns. Empty cells mean
/// "field absent". Rows whose symbol is not in the catalog are skipped.
pub struct DirFeed {
    label: String,
    benchmark: bool,
    root: PathBuf,
    catalog: Arc<SymbolCatalog>,
    cache: Vec<Option<PriceRecord>>,
}

impl DirFeed {
    pub fn new(
        label: impl Into<String>,
        root: impl Into<PathBuf>,
        catalog: Arc<SymbolCatalog>,
    ) -> Self {
        let universe = catalog.len();
        Self {
            label: label.into(),
            benchmark: false,
            root: root.into(),
            catalog,
            cache: vec![None; universe],
        }
    }

    pub fn into_benchmark(mut self) -> Self {
        self.benchmark = true;
        self
    }

    fn parse_cell(cell: &str) -> Option<f64> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse().ok()
    }
}

impl QuoteSource for DirFeed {
    fn quote(&self, security: SecurityId) -> Option<&PriceRecord> {
        self.cache.quote(security)
    }
}

impl PriceFeed for DirFeed {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_benchmark(&self) -> bool {
        self.benchmark
    }

    fn pull(&mut self, date: NaiveDate) -> Result<bool, FeedError> {
        self.clear();
        let path = self.root.join(format!("{}.csv", date.format("%Y-%m-%d")));
        if !path.exists() {
            return Ok(false);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| FeedError::Malformed {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        for row in reader.records() {
            let row = row.map_err(|e| FeedError::Malformed {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let Some(symbol) = row.get(0) else { continue };
            let Some(security) = self.catalog.id(symbol.trim()) else {
                continue;
            };
            let field = |i: usize| row.get(i).and_then(Self::parse_cell);
            let record = PriceRecord {
                date,
                security,
                close: field(1),
                adj_close: field(2),
                adj_return: field(3),
                open: field(4),
                adj_open: field(5),
                // Empty extension cells keep their slot as NaN so later
                // columns stay positionally aligned.
                extra: (6..row.len()).map(|i| field(i).unwrap_or(f64::NAN)).collect(),
            };
            let slot = security.index();
            if slot >= self.cache.len() {
                self.cache.resize(slot + 1, None);
            }
            self.cache[slot] = Some(record);
        }
        Ok(true)
    }

    fn first_quote(&self) -> Option<&PriceRecord> {
        self.cache.iter().flatten().next()
    }

    fn clear(&mut self) {
        self.cache.iter_mut().for_each(|slot| *slot = None);
    }
}
