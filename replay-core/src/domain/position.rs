//! Open holdings.

use super::ids::SecurityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One open holding in one security.
///
/// `quantity` is always a non-negative multiple of the account's lot size.
/// `last_mark` is refreshed only during NAV recomputation, never by the
/// matching engine. "No holding" is the absence of a map entry, not a
/// zeroed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub security: SecurityId,
    pub entry_date: NaiveDate,
    /// Raw fill price at entry.
    pub entry_price: f64,
    /// Adjusted fill price at entry; the exit ratio compounds against this.
    pub entry_adj_price: f64,
    pub quantity: u64,
    /// Mark-to-market value as of the last revaluation.
    pub last_mark: f64,
}

impl Position {
    /// Current economic value at an adjusted price: the adjusted-price ratio
    /// carries any corporate action between entry and now onto the raw
    /// entry price.
    pub fn mark_at(&self, adj_price: f64) -> f64 {
        adj_price / self.entry_adj_price * self.entry_price * self.quantity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(qty: u64) -> Position {
        Position {
            security: SecurityId(0),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            entry_price: 10.0,
            entry_adj_price: 10.0,
            quantity: qty,
            last_mark: 10.0 * qty as f64,
        }
    }

    #[test]
    fn mark_scales_with_adjusted_ratio() {
        let p = pos(4900);
        // A 10% adjusted move marks the raw entry value up 10%.
        assert!((p.mark_at(11.0) - 53_900.0).abs() < 1e-9);
    }
}
