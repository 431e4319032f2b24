//! Order matching: turns intents into fills under price-limit and capital
//! constraints.
//!
//! Each order either fully executes against a single end-of-phase price or
//! fails. Failures are silent (`false`) by design — callers inspect the
//! boolean — and a failed order is never retried: the pending maps are
//! cleared wholesale when the day closes.

use crate::account::Account;
use crate::domain::{
    FillTiming, LedgerEntry, Order, OrderSide, OrderSize, Position, PriceRecord,
};
use crate::feed::QuoteSource;
use chrono::NaiveDate;

/// A security whose adjusted daily return exceeds this cannot realistically
/// be bought (limit-up circuit).
pub const LIMIT_UP_RETURN: f64 = 0.099;

/// A security whose adjusted daily return is below this cannot realistically
/// be sold (limit-down circuit).
pub const LIMIT_DOWN_RETURN: f64 = -0.099;

/// The (raw, adjusted) price pair an order executes against.
fn fill_prices(timing: FillTiming, quote: &PriceRecord) -> (Option<f64>, Option<f64>) {
    match timing {
        FillTiming::AtOpen => (quote.open, quote.adj_open),
        FillTiming::AtClose => (quote.close, quote.adj_close),
    }
}

impl Account {
    /// Submit an order against the current quote. Returns whether it filled.
    ///
    /// The order replaces any pending order for the same security and side
    /// (last-write-wins within a day). On a fill the pending entry is
    /// consumed; on failure it stays parked until `finalize_day` drops it.
    pub fn submit(
        &mut self,
        order: Order,
        quote: Option<&PriceRecord>,
        date: NaiveDate,
    ) -> bool {
        let security = order.security;
        match order.side {
            OrderSide::Buy => {
                self.pending_buys.insert(security, order.clone());
                let filled = quote.is_some_and(|q| self.match_buy(&order, q, date));
                if filled {
                    self.pending_buys.remove(&security);
                }
                filled
            }
            OrderSide::Sell => {
                if !self.positions.contains_key(&security) {
                    // Nothing to sell: the intent is consumed outright.
                    self.pending_sells.remove(&security);
                    return false;
                }
                self.pending_sells.insert(security, order.clone());
                let filled = quote.is_some_and(|q| self.match_sell(&order, q, date));
                if filled {
                    self.pending_sells.remove(&security);
                }
                filled
            }
        }
    }

    /// Synthesize a full-quantity sell per held position and submit each
    /// through the normal path. Returns the number of fills.
    pub fn liquidate_all(
        &mut self,
        quotes: &dyn QuoteSource,
        timing: FillTiming,
        date: NaiveDate,
        annotation: &str,
    ) -> usize {
        let held: Vec<_> = self.positions.keys().copied().collect();
        let mut filled = 0;
        for security in held {
            let order = Order::sell(security, timing, annotation);
            let quote = quotes.quote(security).cloned();
            if self.submit(order, quote.as_ref(), date) {
                filled += 1;
            }
        }
        filled
    }

    fn match_buy(&mut self, order: &Order, quote: &PriceRecord, date: NaiveDate) -> bool {
        let (Some(price), Some(adj_price)) = fill_prices(order.timing, quote) else {
            return false;
        };
        let Some(adj_return) = quote.adj_return else {
            return false;
        };
        if adj_return > LIMIT_UP_RETURN || self.cash <= 0.0 {
            return false;
        }

        let lot = self.lot_size as f64;
        let requested = match order.size {
            Some(OrderSize::Shares(shares)) => shares / self.lot_size * self.lot_size,
            Some(OrderSize::Notional(notional)) => {
                (notional / (price * lot)).floor() as u64 * self.lot_size
            }
            None => return false,
        };
        let affordable =
            (self.cash / (1.0 + self.fee_rate) / (price * lot)).floor() as u64 * self.lot_size;
        let fill_quantity = affordable.min(requested);
        if fill_quantity == 0 {
            return false;
        }

        // Merging with an existing holding re-bases the whole position as if
        // newly bought at today's price: the old leg contributes the share
        // count its current mark would buy now, so pre-trade value is
        // preserved without realizing cash P&L.
        let mut quantity = fill_quantity;
        if let Some(existing) = self.positions.get(&order.security) {
            quantity += (existing.mark_at(adj_price) / price).floor() as u64;
        }

        let debit = fill_quantity as f64 * price * (1.0 + self.fee_rate);
        self.cash -= debit;
        self.positions.insert(
            order.security,
            Position {
                security: order.security,
                entry_date: date,
                entry_price: price,
                entry_adj_price: adj_price,
                quantity,
                last_mark: quantity as f64 * price,
            },
        );
        self.ledger.push(LedgerEntry {
            date,
            security: order.security,
            quantity: fill_quantity,
            side: OrderSide::Buy,
            cash_delta: -debit,
            price,
            adj_price,
            annotation: order.annotation.clone(),
        });
        true
    }

    fn match_sell(&mut self, order: &Order, quote: &PriceRecord, date: NaiveDate) -> bool {
        let (Some(price), Some(adj_price)) = fill_prices(order.timing, quote) else {
            return false;
        };
        let Some(adj_return) = quote.adj_return else {
            return false;
        };
        if adj_return < LIMIT_DOWN_RETURN {
            return false;
        }
        let Some(position) = self.positions.get(&order.security) else {
            return false;
        };

        // The adjusted-price ratio compounds any corporate action between
        // entry and exit onto the raw entry price.
        let proceeds = position.mark_at(adj_price) * (1.0 - self.fee_rate);
        let quantity = position.quantity;
        self.cash += proceeds;
        self.ledger.push(LedgerEntry {
            date,
            security: order.security,
            quantity,
            side: OrderSide::Sell,
            cash_delta: proceeds,
            price,
            adj_price,
            annotation: order.annotation.clone(),
        });
        self.positions.remove(&order.security);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SecurityId;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn quote(price: f64, adj: f64, ret: f64) -> PriceRecord {
        PriceRecord::full(d("2024-01-02"), SecurityId(0), price, adj, ret, price, adj)
    }

    #[test]
    fn missing_quote_fails_and_parks_the_order() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let order = Order::buy_notional(SecurityId(0), 50_000.0, FillTiming::AtClose, "");
        assert!(!account.submit(order, None, d("2024-01-02")));
        assert_eq!(account.pending_buys.len(), 1);
        assert!(account.ledger.is_empty());
        assert_eq!(account.cash, 1_000_000.0);
    }

    #[test]
    fn buy_notional_rounds_down_to_lots() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let order = Order::buy_notional(SecurityId(0), 50_000.0, FillTiming::AtClose, "");
        let q = quote(10.0, 10.0, 0.02);
        assert!(account.submit(order, Some(&q), d("2024-01-02")));

        // floor(50_000 / (10 * 100)) * 100 = 5000 shares; the fee is paid on
        // top of the notional, not carved out of it.
        let fill = account.ledger.last().unwrap();
        assert_eq!(fill.quantity, 5_000);
        assert!((account.cash - 949_975.0).abs() < 1e-6);
        assert_eq!(account.positions[&SecurityId(0)].quantity, 5_000);
    }

    #[test]
    fn buy_shares_rounds_down_to_lots() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let q = quote(10.0, 10.0, 0.0);

        let odd = Order::buy_shares(SecurityId(0), 150, FillTiming::AtClose, "");
        assert!(account.submit(odd, Some(&q), d("2024-01-02")));
        assert_eq!(account.ledger.last().unwrap().quantity, 100);
        assert_eq!(account.positions[&SecurityId(0)].quantity % 100, 0);

        // Below one lot there is nothing to fill.
        let sub_lot = Order::buy_shares(SecurityId(1), 99, FillTiming::AtClose, "");
        assert!(!account.submit(sub_lot, Some(&q), d("2024-01-02")));
    }

    #[test]
    fn buy_is_capped_by_affordable_cash() {
        let mut account = Account::new("a1", 10_000.0, 0.0005);
        let order = Order::buy_shares(SecurityId(0), 5_000, FillTiming::AtClose, "");
        let q = quote(10.0, 10.0, 0.0);
        assert!(account.submit(order, Some(&q), d("2024-01-02")));

        // floor(10_000 / 1.0005 / 1000) * 100 = 900 shares.
        assert_eq!(account.ledger.last().unwrap().quantity, 900);
        assert!(account.cash >= 0.0);
    }

    #[test]
    fn limit_up_boundary_is_inclusive() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let at_limit = quote(10.0, 10.0, 0.099);
        let over_limit = quote(10.0, 10.0, 0.0991);

        let order = Order::buy_shares(SecurityId(0), 100, FillTiming::AtClose, "");
        assert!(account.submit(order.clone(), Some(&at_limit), d("2024-01-02")));
        assert!(!account.submit(order, Some(&over_limit), d("2024-01-02")));
    }

    #[test]
    fn limit_down_boundary_is_inclusive() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let entry = quote(10.0, 10.0, 0.0);
        let buy = Order::buy_shares(SecurityId(0), 100, FillTiming::AtClose, "");
        assert!(account.submit(buy, Some(&entry), d("2024-01-02")));

        let sell = Order::sell(SecurityId(0), FillTiming::AtClose, "");
        let locked = quote(9.0, 9.0, -0.0991);
        assert!(!account.submit(sell.clone(), Some(&locked), d("2024-01-03")));
        // Position survives a guard failure.
        assert!(account.positions.contains_key(&SecurityId(0)));

        let at_limit = quote(9.01, 9.01, -0.099);
        assert!(account.submit(sell, Some(&at_limit), d("2024-01-03")));
        assert!(!account.positions.contains_key(&SecurityId(0)));
    }

    #[test]
    fn sell_proceeds_compound_the_adjusted_ratio() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let entry = quote(10.0, 10.0, 0.02);
        let buy = Order::buy_notional(SecurityId(0), 50_000.0, FillTiming::AtClose, "");
        assert!(account.submit(buy, Some(&entry), d("2024-01-02")));
        let cash_before = account.cash;

        let exit = quote(11.0, 11.0, -0.01);
        let sell = Order::sell(SecurityId(0), FillTiming::AtClose, "");
        assert!(account.submit(sell, Some(&exit), d("2024-01-03")));

        // (11/10) * 10 * 5000 * 0.9995
        let expected = 11.0 / 10.0 * 10.0 * 5_000.0 * 0.9995;
        assert!((account.cash - cash_before - expected).abs() < 1e-6);
        assert!(account.positions.is_empty());
    }

    #[test]
    fn sell_without_position_consumes_the_order() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let q = quote(10.0, 10.0, 0.0);
        let sell = Order::sell(SecurityId(0), FillTiming::AtClose, "");
        assert!(!account.submit(sell, Some(&q), d("2024-01-02")));
        assert!(account.pending_sells.is_empty());
        assert!(account.ledger.is_empty());
    }

    #[test]
    fn merge_rebases_existing_holding_at_the_new_price() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0);
        let day1 = quote(10.0, 10.0, 0.0);
        let buy1 = Order::buy_shares(SecurityId(0), 1_000, FillTiming::AtClose, "");
        assert!(account.submit(buy1, Some(&day1), d("2024-01-02")));

        // Price doubles; the old 1000 shares at 10 are worth 20_000, which
        // buys 1000 hypothetical shares at the new price of 20.
        let day2 = quote(20.0, 20.0, 0.05);
        let buy2 = Order::buy_shares(SecurityId(0), 500, FillTiming::AtClose, "");
        assert!(account.submit(buy2, Some(&day2), d("2024-01-03")));

        let position = &account.positions[&SecurityId(0)];
        assert_eq!(position.quantity, 1_500);
        assert_eq!(position.entry_price, 20.0);
        assert_eq!(position.entry_date, d("2024-01-03"));
        // Only the new leg moved cash.
        assert_eq!(account.ledger.last().unwrap().quantity, 500);
    }

    #[test]
    fn resubmission_same_day_is_last_write_wins() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let first = Order::buy_shares(SecurityId(0), 100, FillTiming::AtClose, "first");
        let second = Order::buy_shares(SecurityId(0), 200, FillTiming::AtClose, "second");
        assert!(!account.submit(first, None, d("2024-01-02")));
        assert!(!account.submit(second, None, d("2024-01-02")));
        assert_eq!(account.pending_buys.len(), 1);
        assert_eq!(account.pending_buys[&SecurityId(0)].annotation, "second");
    }

    #[test]
    fn liquidate_all_flattens_every_holding() {
        let mut account = Account::new("a1", 1_000_000.0, 0.0005);
        let d1 = d("2024-01-02");
        for id in 0..3u32 {
            let q = PriceRecord::full(d1, SecurityId(id), 10.0, 10.0, 0.0, 10.0, 10.0);
            let buy = Order::buy_shares(SecurityId(id), 100, FillTiming::AtClose, "");
            assert!(account.submit(buy, Some(&q), d1));
        }
        assert_eq!(account.held_count(), 3);

        let d2 = d("2024-01-03");
        let quotes: Vec<Option<PriceRecord>> = (0..3u32)
            .map(|id| {
                Some(PriceRecord::full(
                    d2,
                    SecurityId(id),
                    10.5,
                    10.5,
                    0.05,
                    10.4,
                    10.4,
                ))
            })
            .collect();
        let filled = account.liquidate_all(&quotes, FillTiming::AtOpen, d2, "reset");
        assert_eq!(filled, 3);
        assert_eq!(account.held_count(), 0);
    }
}
