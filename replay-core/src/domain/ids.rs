use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, process-local key for a tradable instrument.
///
/// Ids are handed out sequentially by the [`SymbolCatalog`](crate::symbols::SymbolCatalog)
/// so feeds can cache per-day records in a flat `Vec` indexed by id. Stable
/// for the lifetime of one simulation; never persisted across catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecurityId(pub u32);

impl SecurityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
