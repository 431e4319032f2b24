//! Report artifacts — write-only tables an external renderer consumes.

pub mod export;
pub mod nav;
pub mod summary;
pub mod trades;

pub use export::{export_account, ExportOutcome};
