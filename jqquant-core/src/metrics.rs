//! Performance metrics: pure functions over the recorded value history.
//!
//! Every metric is a pure function: value curve and/or return series in,
//! scalar out. No dependencies on the engine or data pipeline.

use crate::domain::{PortfolioSnapshot, TradeRecord};
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Headline metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    /// Non-negative magnitude, e.g. 0.15 = 15% peak-to-trough.
    pub max_drawdown: f64,
    pub total_trades: usize,
}

impl Metrics {
    /// Compute every metric from the value history.
    ///
    /// `total_return` is the summary profit rate, measured against the
    /// initial cash rather than the first recorded value.
    pub fn compute(total_return: f64, values: &[f64], total_trades: usize) -> Self {
        let returns = pct_change(values);
        Self {
            total_return,
            annual_return: annual_return(total_return, values.len()),
            sharpe_ratio: sharpe_ratio(&returns),
            max_drawdown: max_drawdown(&returns),
            total_trades,
        }
    }
}

/// Daily return aligned to a recorded timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub timestamp: chrono::NaiveDateTime,
    pub total_value: f64,
    pub daily_return: f64,
}

/// Date-aligned return series from the snapshot history.
pub fn return_series(history: &[PortfolioSnapshot]) -> Vec<ReturnPoint> {
    let values: Vec<f64> = history.iter().map(|s| s.total_value).collect();
    history
        .iter()
        .zip(pct_change(&values))
        .map(|(snap, r)| ReturnPoint {
            timestamp: snap.timestamp,
            total_value: snap.total_value,
            daily_return: r,
        })
        .collect()
}

/// Percentage change of a value curve; the first element is defined as 0.
///
/// A step from a non-positive value yields 0 rather than an infinity.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    out.push(0.0);
    out.extend(values.windows(2).map(|w| {
        if w[0] > 0.0 {
            (w[1] - w[0]) / w[0]
        } else {
            0.0
        }
    }));
    out
}

/// `(1 + total_return) ^ (252 / recorded_dates) - 1`.
///
/// Returns 0.0 with no recorded dates, and -1.0 when the account was wiped out.
pub fn annual_return(total_return: f64, recorded_dates: usize) -> f64 {
    if recorded_dates == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / recorded_dates as f64) - 1.0
}

/// Annualized Sharpe ratio: `mean(returns) / std(returns) * sqrt(252)`.
///
/// Uses the sample standard deviation. Returns 0.0 when there are fewer
/// than 2 points or the series has no variance.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Cumulative growth curve `Π(1 + r)`.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

/// Largest peak-to-trough decline of the cumulative return curve, as a
/// non-negative fraction. 0.0 for an empty series.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for v in cumulative_returns(returns) {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - v) / peak);
        }
    }
    max_dd
}

/// Trade ledger sorted chronologically by fill date.
///
/// The sort is stable: fills on the same date keep submission order.
pub fn sort_trades(mut trades: Vec<TradeRecord>) -> Vec<TradeRecord> {
    trades.sort_by_key(|t| t.date);
    trades
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_starts_at_zero() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 0.0);
        assert!((r[1] - 0.1).abs() < 1e-10);
        assert!((r[2] + 0.1).abs() < 1e-10);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn pct_change_guards_zero_base() {
        assert_eq!(pct_change(&[0.0, 10.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn annual_return_zero_without_history() {
        assert_eq!(annual_return(0.5, 0), 0.0);
    }

    #[test]
    fn annual_return_full_year_equals_total() {
        assert!((annual_return(0.1, 252) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn annual_return_compounds_half_year() {
        let expected = 1.1_f64.powi(2) - 1.0;
        assert!((annual_return(0.1, 126) - expected).abs() < 1e-10);
    }

    #[test]
    fn annual_return_wiped_out() {
        assert_eq!(annual_return(-1.0, 10), -1.0);
    }

    #[test]
    fn sharpe_zero_for_flat_series() {
        assert_eq!(sharpe_ratio(&[0.0; 10]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        let r: [f64; 4] = [0.0, 0.01, -0.005, 0.02];
        let m = (0.01 - 0.005 + 0.02) / 4.0;
        let var = r.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 3.0;
        let expected = m / var.sqrt() * 252.0_f64.sqrt();
        assert!((sharpe_ratio(&r) - expected).abs() < 1e-10);
    }

    #[test]
    fn sharpe_positive_for_uptrend() {
        assert!(sharpe_ratio(&[0.0, 0.01, 0.02, 0.01, 0.015]) > 0.0);
    }

    #[test]
    fn max_drawdown_of_known_curve() {
        // 100 -> 120 -> 90 -> 130: trough is 25% below the 120 peak.
        let r = pct_change(&[100.0, 120.0, 90.0, 130.0]);
        assert!((max_drawdown(&r) - 0.25).abs() < 1e-10);
    }

    #[test]
    fn max_drawdown_zero_when_monotonic_or_empty() {
        assert_eq!(max_drawdown(&[0.0, 0.01, 0.02]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
        assert_eq!(max_drawdown(&[0.0; 10]), 0.0);
    }

    #[test]
    fn cumulative_returns_compound() {
        let c = cumulative_returns(&[0.0, 0.1, -0.5]);
        assert!((c[2] - 0.55).abs() < 1e-10);
    }

    #[test]
    fn compute_flat_history() {
        let m = Metrics::compute(0.0, &[1_000_000.0; 10], 0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.annual_return, 0.0);
        assert_eq!(m.total_trades, 0);
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        assert!((std_dev(&[1.0, 3.0]) - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }
}
