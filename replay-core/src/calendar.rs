//! Trading-calendar seam.
//!
//! The clock never computes dates itself; it asks a calendar collaborator for
//! the next trading date strictly after the current one. Exhaustion is a
//! normal termination condition (`Ok(None)`), not an error.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar lookup failed: {0}")]
    Lookup(String),
}

pub trait TradingCalendar {
    fn next_trading_date(&self, after: NaiveDate) -> Result<Option<NaiveDate>, CalendarError>;
}

/// Calendar backed by a pre-sorted list of trading dates.
#[derive(Debug, Clone)]
pub struct SliceCalendar {
    dates: Vec<NaiveDate>,
}

impl SliceCalendar {
    pub fn new(mut dates: Vec<NaiveDate>) -> Self {
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl TradingCalendar for SliceCalendar {
    fn next_trading_date(&self, after: NaiveDate) -> Result<Option<NaiveDate>, CalendarError> {
        let idx = self.dates.partition_point(|&d| d <= after);
        Ok(self.dates.get(idx).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn next_date_is_strictly_after() {
        let cal = SliceCalendar::new(vec![d("2024-01-02"), d("2024-01-03"), d("2024-01-05")]);
        assert_eq!(
            cal.next_trading_date(d("2024-01-02")).unwrap(),
            Some(d("2024-01-03"))
        );
        // Non-trading day in between resolves to the next trading date.
        assert_eq!(
            cal.next_trading_date(d("2024-01-04")).unwrap(),
            Some(d("2024-01-05"))
        );
        // Seed date before the first entry starts at the first entry.
        assert_eq!(
            cal.next_trading_date(d("2023-12-29")).unwrap(),
            Some(d("2024-01-02"))
        );
    }

    #[test]
    fn exhaustion_is_none_not_error() {
        let cal = SliceCalendar::new(vec![d("2024-01-02")]);
        assert_eq!(cal.next_trading_date(d("2024-01-02")).unwrap(), None);
    }
}
