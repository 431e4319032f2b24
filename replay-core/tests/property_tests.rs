//! Property tests for matching/accounting invariants.
//!
//! Uses proptest to verify, across arbitrary order streams:
//! 1. Cash never goes negative
//! 2. Cash always equals initial capital plus the signed ledger deltas
//! 3. Buy fill quantities are lot multiples and debits match the fee model

use chrono::NaiveDate;
use proptest::prelude::*;
use replay_core::account::Account;
use replay_core::domain::{FillTiming, Order, OrderSide, OrderSize, PriceRecord, SecurityId};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

#[derive(Debug, Clone)]
struct Step {
    security: u32,
    buy: bool,
    notional: f64,
    price: f64,
    adj_return: f64,
}

fn arb_step() -> impl Strategy<Value = Step> {
    (
        0..4u32,
        any::<bool>(),
        1_000.0..200_000.0f64,
        1.0..500.0f64,
        -0.11..0.11f64,
    )
        .prop_map(|(security, buy, notional, price, adj_return)| Step {
            security,
            buy,
            notional: (notional * 100.0).round() / 100.0,
            price: (price * 100.0).round() / 100.0,
            adj_return,
        })
}

proptest! {
    #[test]
    fn cash_stays_consistent_over_arbitrary_order_streams(
        steps in prop::collection::vec(arb_step(), 1..60)
    ) {
        let initial = 1_000_000.0;
        let mut account = Account::new("prop", initial, 0.0005);

        for (i, step) in steps.iter().enumerate() {
            let date = base_date() + chrono::Duration::days(i as i64);
            let security = SecurityId(step.security);
            let quote = PriceRecord::full(
                date,
                security,
                step.price,
                step.price,
                step.adj_return,
                step.price,
                step.price,
            );
            let order = if step.buy {
                Order::buy_notional(security, step.notional, FillTiming::AtClose, "")
            } else {
                Order::sell(security, FillTiming::AtClose, "")
            };

            let cash_before = account.cash;
            let fills_before = account.ledger.len();
            let filled = account.submit(order, Some(&quote), date);

            prop_assert!(account.cash >= 0.0, "cash went negative: {}", account.cash);
            if filled {
                let fill = account.ledger.last().unwrap();
                prop_assert!((account.cash - cash_before - fill.cash_delta).abs() < 1e-6);
                match fill.side {
                    OrderSide::Buy => {
                        prop_assert_eq!(fill.quantity % account.lot_size, 0);
                        let expected = fill.quantity as f64 * fill.price * 1.0005;
                        prop_assert!((fill.cash_delta + expected).abs() < 1e-6);
                    }
                    OrderSide::Sell => {
                        prop_assert!(fill.cash_delta > 0.0);
                        prop_assert!(!account.positions.contains_key(&security));
                    }
                }
            } else {
                prop_assert_eq!(account.ledger.len(), fills_before);
                prop_assert!((account.cash - cash_before).abs() < f64::EPSILON);
            }
        }

        // The running ledger reconciles with cash exactly.
        let delta: f64 = account.ledger.iter().map(|f| f.cash_delta).sum();
        prop_assert!((account.cash - (initial + delta)).abs() < 1e-4);
    }

    #[test]
    fn buys_never_fill_beyond_requested_shares(
        // Deliberately includes non-lot-multiple requests; fills must still
        // come out as lot multiples, never above the request.
        shares in 1u64..200_000,
        price in 1.0..100.0f64,
    ) {
        let mut account = Account::new("prop", 1_000_000.0, 0.0005);
        let quote = PriceRecord::full(
            base_date(),
            SecurityId(0),
            price,
            price,
            0.0,
            price,
            price,
        );
        let order = Order {
            security: SecurityId(0),
            side: OrderSide::Buy,
            size: Some(OrderSize::Shares(shares)),
            price_hint: None,
            timing: FillTiming::AtClose,
            annotation: String::new(),
        };
        if account.submit(order, Some(&quote), base_date()) {
            let fill = account.ledger.last().unwrap();
            prop_assert!(fill.quantity <= shares);
            prop_assert_eq!(fill.quantity % account.lot_size, 0);
            prop_assert!(account.cash >= 0.0);
        }
    }
}
