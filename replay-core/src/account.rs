//! Simulated trading account: cash, positions, pending orders, histories.

use crate::domain::{BenchmarkPoint, LedgerEntry, NavPoint, Order, Position, SecurityId};
use crate::feed::QuoteSource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default minimum tradable increment.
pub const DEFAULT_LOT_SIZE: u64 = 100;

/// One simulated account.
///
/// Invariants maintained by the matching engine and `finalize_day`:
/// - `cash >= 0` at all times (buy quantity is capped so cost fits cash);
/// - at most one position per security;
/// - `ledger` and `nav_history` are append-only;
/// - `nav_history` starts only once the first fill has happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub cash: f64,
    pub fee_rate: f64,
    pub lot_size: u64,
    pub positions: HashMap<SecurityId, Position>,
    pub pending_buys: HashMap<SecurityId, Order>,
    pub pending_sells: HashMap<SecurityId, Order>,
    pub nav: f64,
    pub ledger: Vec<LedgerEntry>,
    pub nav_history: Vec<NavPoint>,
}

impl Account {
    pub fn new(id: impl Into<String>, capital: f64, fee_rate: f64) -> Self {
        Self {
            id: id.into(),
            cash: capital,
            fee_rate,
            lot_size: DEFAULT_LOT_SIZE,
            positions: HashMap::new(),
            pending_buys: HashMap::new(),
            pending_sells: HashMap::new(),
            nav: capital,
            ledger: Vec::new(),
            nav_history: Vec::new(),
        }
    }

    pub fn with_lot_size(mut self, lot_size: u64) -> Self {
        self.lot_size = lot_size;
        self
    }

    /// Number of securities currently held.
    pub fn held_count(&self) -> usize {
        self.positions.len()
    }

    /// Recompute mark-to-market NAV.
    ///
    /// Positions with no current adjusted close keep their last known mark —
    /// stale, but not discarded.
    pub fn revalue(&mut self, quotes: &dyn QuoteSource) {
        let mut marked = 0.0;
        for position in self.positions.values_mut() {
            if let Some(adj_close) = quotes.quote(position.security).and_then(|q| q.adj_close) {
                position.last_mark = position.mark_at(adj_close);
            }
            marked += position.last_mark;
        }
        self.nav = self.cash + marked;
    }

    /// End-of-day bookkeeping, called by the clock after the last phase.
    ///
    /// Purges empty positions, drops all pending orders (orders never survive
    /// a day boundary), revalues, and appends one NAV-history row — but only
    /// once trading has started, and at most once per date, so repeating the
    /// call for the same day changes nothing.
    pub fn finalize_day(
        &mut self,
        date: NaiveDate,
        benchmark: &BenchmarkPoint,
        quotes: &dyn QuoteSource,
    ) {
        self.positions.retain(|_, p| p.quantity > 0);
        self.pending_buys.clear();
        self.pending_sells.clear();
        self.revalue(quotes);

        if self.ledger.is_empty() {
            return;
        }
        if self.nav_history.last().is_some_and(|row| row.date == date) {
            return;
        }
        let nav_return = match self.nav_history.last() {
            Some(prev) => self.nav / prev.nav - 1.0,
            None => 0.0,
        };
        self.nav_history.push(NavPoint {
            date,
            benchmark: benchmark.value,
            benchmark_return: benchmark.daily_return,
            nav: self.nav,
            nav_return,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRecord;

    struct NoQuotes;
    impl QuoteSource for NoQuotes {
        fn quote(&self, _security: SecurityId) -> Option<&PriceRecord> {
            None
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn nav_history_waits_for_first_fill() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        for day in ["2024-01-02", "2024-01-03", "2024-01-04"] {
            account.finalize_day(d(day), &BenchmarkPoint::neutral(d(day)), &NoQuotes);
        }
        assert!(account.nav_history.is_empty());
        assert_eq!(account.nav, 1_000_000.0);
    }

    #[test]
    fn stale_position_keeps_last_mark() {
        let mut account = Account::new("a1", 0.0, 0.0);
        account.positions.insert(
            SecurityId(0),
            Position {
                security: SecurityId(0),
                entry_date: d("2024-01-02"),
                entry_price: 10.0,
                entry_adj_price: 10.0,
                quantity: 100,
                last_mark: 1_000.0,
            },
        );
        account.revalue(&NoQuotes);
        assert_eq!(account.nav, 1_000.0);
    }
}
