//! Performance metrics — pure functions over an account's NAV history.
//!
//! Every metric is a pure function: NAV rows in, scalar (or series) out.
//! No dependencies on the driver, feeds, or engine.

use replay_core::domain::NavPoint;
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 250.0;

/// The excess-return index re-anchors its compounding base every this many
/// observations, bounding drift over long histories.
pub const EXCESS_REBASE_INTERVAL: usize = 20;

/// Aggregate performance statistics for one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero — undefined, reported as a sentinel
    /// rather than a crash or an infinity in the artifact.
    pub sharpe: Option<f64>,
}

impl PerformanceSummary {
    /// Compute all statistics; `None` for an empty NAV history.
    pub fn compute(nav_history: &[NavPoint]) -> Option<Self> {
        if nav_history.is_empty() {
            return None;
        }
        let total_return = total_return(nav_history);
        let annualized_return = annualized_return(nav_history);
        let annualized_volatility = annualized_volatility(nav_history);
        let sharpe = if annualized_volatility < 1e-15 {
            None
        } else {
            Some(annualized_return / annualized_volatility)
        };
        Some(Self {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe,
        })
    }
}

/// Rolling strategy-over-benchmark excess index.
///
/// Each observation compounds `(1 + strategy) - (1 + benchmark)` measured
/// against a rebasing anchor that resets every [`EXCESS_REBASE_INTERVAL`]
/// rows.
pub fn excess_index(nav_history: &[NavPoint]) -> Vec<f64> {
    let mut index = vec![1.0; nav_history.len()];
    let mut anchor = 0;
    for i in 0..nav_history.len() {
        let earning = nav_history[i].nav / nav_history[anchor].nav
            - nav_history[i].benchmark / nav_history[anchor].benchmark;
        index[i] = index[anchor] * (1.0 + earning);
        if i % EXCESS_REBASE_INTERVAL == 0 {
            anchor = i;
        }
    }
    index
}

/// `nav[last] / nav[0] - 1`.
pub fn total_return(nav_history: &[NavPoint]) -> f64 {
    match (nav_history.first(), nav_history.last()) {
        (Some(first), Some(last)) if first.nav > 0.0 => last.nav / first.nav - 1.0,
        _ => 0.0,
    }
}

/// `(1 + total)^(250/N) - 1` over N observed rows.
pub fn annualized_return(nav_history: &[NavPoint]) -> f64 {
    if nav_history.is_empty() {
        return 0.0;
    }
    let total = total_return(nav_history);
    (1.0 + total).powf(TRADING_DAYS_PER_YEAR / nav_history.len() as f64) - 1.0
}

/// Sample standard deviation of daily strategy returns, scaled by √250.
pub fn annualized_volatility(nav_history: &[NavPoint]) -> f64 {
    let returns: Vec<f64> = nav_history.iter().map(|row| row.nav_return).collect();
    sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
