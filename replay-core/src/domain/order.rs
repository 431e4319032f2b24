//! Trading intents submitted during phase callbacks.

use super::ids::SecurityId;
use serde::{Deserialize, Serialize};

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// Which end-of-phase price an order executes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillTiming {
    /// Fill at the day's open / adjusted open.
    AtOpen,
    /// Fill at the day's close / adjusted close.
    AtClose,
}

/// How much to buy. Exactly one sizing mode per order, by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderSize {
    /// An explicit share count (rounded down to a lot multiple at match time).
    Shares(u64),
    /// A cash budget; the engine derives the share count from the fill price.
    Notional(f64),
}

/// A trading intent, alive for at most one day.
///
/// Orders are consumed synchronously by the matching engine in the same call
/// that submits them; whatever fails to fill is dropped when the day closes.
/// A second submission for the same security and side within one day replaces
/// the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub security: SecurityId,
    pub side: OrderSide,
    /// Required for buys; sells always flatten the full position.
    pub size: Option<OrderSize>,
    /// Advisory only; the matching engine never reads it.
    pub price_hint: Option<f64>,
    pub timing: FillTiming,
    pub annotation: String,
}

impl Order {
    pub fn buy_shares(
        security: SecurityId,
        shares: u64,
        timing: FillTiming,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            security,
            side: OrderSide::Buy,
            size: Some(OrderSize::Shares(shares)),
            price_hint: None,
            timing,
            annotation: annotation.into(),
        }
    }

    pub fn buy_notional(
        security: SecurityId,
        notional: f64,
        timing: FillTiming,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            security,
            side: OrderSide::Buy,
            size: Some(OrderSize::Notional(notional)),
            price_hint: None,
            timing,
            annotation: annotation.into(),
        }
    }

    pub fn sell(
        security: SecurityId,
        timing: FillTiming,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            security,
            side: OrderSide::Sell,
            size: None,
            price_hint: None,
            timing,
            annotation: annotation.into(),
        }
    }

    pub fn with_price_hint(mut self, hint: f64) -> Self {
        self.price_hint = Some(hint);
        self
    }
}
