//! Replay Core — deterministic daily market replay through simulated accounts.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (price records, orders, positions, ledger rows)
//! - Order matching with price-limit and capital guards
//! - Portfolio valuation and the append-only NAV/trade histories
//! - The four-phase day-stepping simulation clock
//! - Feed / calendar seams for external market data
//! - Atomic, date-keyed checkpointing for crash recovery

pub mod account;
pub mod calendar;
pub mod checkpoint;
pub mod clock;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod symbols;

pub use account::Account;
pub use clock::{Clock, ClockSnapshot, Phase};
