//! Replay Runner — session orchestration around the core simulator.
//!
//! - `driver`: the advance/gate/phases/checkpoint loop and cutoff policies
//! - `metrics`: pure performance statistics over NAV histories
//! - `reporting`: CSV artifacts for external renderers
//! - `config`: TOML session configuration

pub mod config;
pub mod driver;
pub mod metrics;
pub mod reporting;

pub use config::{AccountConfig, RunConfig};
pub use driver::{run_session, CutoffPolicy, SessionReport, StopReason};
pub use metrics::PerformanceSummary;
