//! Daily price records as delivered by a feed.

use super::ids::SecurityId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One security's quote for one trading date.
///
/// Every price field is optional: a feed may deliver a record with holes
/// (suspended trading, missing adjustment factors). "No record at all" is
/// expressed by the feed returning `None`, never by a zeroed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub security: SecurityId,
    pub close: Option<f64>,
    /// Close restated for splits/dividends.
    pub adj_close: Option<f64>,
    /// Daily adjusted return; the limit-up/limit-down guards read this.
    pub adj_return: Option<f64>,
    pub open: Option<f64>,
    pub adj_open: Option<f64>,
    /// Feed-specific extension columns, in file order; an absent cell holds
    /// NaN so the indices of later columns never shift.
    pub extra: Vec<f64>,
}

impl PriceRecord {
    /// A record with every price field present and a flat adjustment.
    pub fn full(
        date: NaiveDate,
        security: SecurityId,
        close: f64,
        adj_close: f64,
        adj_return: f64,
        open: f64,
        adj_open: f64,
    ) -> Self {
        Self {
            date,
            security,
            close: Some(close),
            adj_close: Some(adj_close),
            adj_return: Some(adj_return),
            open: Some(open),
            adj_open: Some(adj_open),
            extra: Vec::new(),
        }
    }
}
