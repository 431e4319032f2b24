//! Append-only history rows: fills, NAV marks, benchmark marks.

use super::ids::SecurityId;
use super::order::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One executed fill in the trade ledger.
///
/// `cash_delta` is signed: negative for buys (debit incl. fee), positive for
/// sells (proceeds net of fee). The cosmetic symbol string is resolved from
/// the catalog at report time, not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub security: SecurityId,
    pub quantity: u64,
    pub side: OrderSide,
    pub cash_delta: f64,
    pub price: f64,
    pub adj_price: f64,
    pub annotation: String,
}

/// One row of an account's NAV history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub benchmark: f64,
    pub benchmark_return: f64,
    pub nav: f64,
    /// Day-over-day NAV return; 0 on the first recorded row.
    pub nav_return: f64,
}

/// One row of the clock's benchmark-index history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub daily_return: f64,
}

impl BenchmarkPoint {
    /// Placeholder row for a day the benchmark feed had no data.
    pub fn neutral(date: NaiveDate) -> Self {
        Self {
            date,
            value: 1.0,
            daily_return: 0.0,
        }
    }
}
