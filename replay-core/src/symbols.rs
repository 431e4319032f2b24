//! Symbol ↔ id interning.
//!
//! Security ids are dense so feeds can cache per-day records in a flat slab.
//! The catalog is the only place ids are minted; everything downstream treats
//! them as opaque. Symbols are cosmetic — reports and feed files use them,
//! the engine never does.

use crate::domain::SecurityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    by_symbol: HashMap<String, SecurityId>,
    symbols: Vec<String>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a fixed universe, ids assigned in iteration order.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for s in symbols {
            catalog.intern(&s.into());
        }
        catalog
    }

    /// Return the id for `symbol`, minting a new dense id if unseen.
    pub fn intern(&mut self, symbol: &str) -> SecurityId {
        if let Some(&id) = self.by_symbol.get(symbol) {
            return id;
        }
        let id = SecurityId(self.symbols.len() as u32);
        self.symbols.push(symbol.to_string());
        self.by_symbol.insert(symbol.to_string(), id);
        id
    }

    pub fn id(&self, symbol: &str) -> Option<SecurityId> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn symbol(&self, id: SecurityId) -> Option<&str> {
        self.symbols.get(id.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
