//! Order matching and fill accounting.

pub mod matching;

pub use matching::{LIMIT_DOWN_RETURN, LIMIT_UP_RETURN};
