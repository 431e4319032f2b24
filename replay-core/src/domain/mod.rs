//! Passive domain entities shared across the engine, clock, and checkpointing.

pub mod ids;
pub mod ledger;
pub mod order;
pub mod position;
pub mod price;

pub use ids::SecurityId;
pub use ledger::{BenchmarkPoint, LedgerEntry, NavPoint};
pub use order::{FillTiming, Order, OrderSide, OrderSize};
pub use position::Position;
pub use price::PriceRecord;
