//! Run result types.

use crate::domain::{Frequency, PortfolioSnapshot, PortfolioSummary, Position, TradeRecord};
use crate::metrics::{Metrics, ReturnPoint};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Bumped whenever the serialized layout of [`BacktestResult`] changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Why a date was skipped without running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    Processed,
    Skipped(SkipReason),
    /// The pipeline failed part-way; nothing was recorded for the date.
    Failed(String),
}

/// What happened on one date of the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub timestamp: NaiveDateTime,
    pub status: DayStatus,
}

/// Everything a completed run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub strategy: String,
    pub securities: Vec<String>,
    pub frequency: Frequency,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Informational only; no benchmark series is computed.
    #[serde(default)]
    pub benchmark: Option<String>,
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub slippage: f64,
    /// BLAKE3 over the fetched price rows.
    pub dataset_hash: String,
    pub summary: PortfolioSummary,
    pub metrics: Metrics,
    pub portfolio_history: Vec<PortfolioSnapshot>,
    pub returns: Vec<ReturnPoint>,
    /// One entry per filled order, sorted by fill date.
    pub trade_history: Vec<TradeRecord>,
    pub final_positions: Vec<Position>,
    pub rejected_orders: usize,
    pub diagnostics: Vec<DayOutcome>,
}

impl BacktestResult {
    pub fn processed_dates(&self) -> usize {
        self.count(|s| matches!(s, DayStatus::Processed))
    }

    pub fn skipped_dates(&self) -> usize {
        self.count(|s| matches!(s, DayStatus::Skipped(_)))
    }

    pub fn failed_dates(&self) -> usize {
        self.count(|s| matches!(s, DayStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&DayStatus) -> bool) -> usize {
        self.diagnostics.iter().filter(|d| pred(&d.status)).count()
    }
}
