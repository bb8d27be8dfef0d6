//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over price sources (vendor API, CSV files,
//! synthetic series) so the engine never knows where bars come from.

use crate::domain::{Bar, Frequency};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row {line} in {path}: {message}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("provider '{provider}' does not support frequency {frequency}")]
    UnsupportedFrequency {
        provider: String,
        frequency: Frequency,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// Tabular provider result: price rows annotated with their security.
///
/// Rows are kept sorted by timestamp, then security.
#[derive(Debug, Clone, Default)]
pub struct PriceFrame {
    rows: Vec<Bar>,
}

impl PriceFrame {
    pub fn new(mut rows: Vec<Bar>) -> Self {
        rows.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.security.cmp(&b.security))
        });
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Bar] {
        &self.rows
    }

    /// Distinct securities present, sorted.
    pub fn securities(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|b| b.security.as_str()).collect()
    }
}

/// Price source consumed by the engine.
///
/// Implementations return an empty frame (not an error) when nothing is
/// available for the request. Errors are reserved for broken sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch OHLCV rows for `securities` with timestamps inside
    /// `[start, end]` (inclusive, by date).
    fn get_price_data(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
        frequency: Frequency,
    ) -> Result<PriceFrame, DataError>;
}

/// Shared range validation for provider implementations.
pub(crate) fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), DataError> {
    if start > end {
        return Err(DataError::InvalidRange { start, end });
    }
    Ok(())
}
