//! Bar: one OHLCV price row for a single security at a single timestamp.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// OHLCV row as delivered by a data provider.
///
/// Daily bars are stamped at midnight of their trading date; intraday bars
/// carry the bar's close time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub security: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Closing price usable for marking and settlement.
    ///
    /// `None` when the close is NaN, infinite or non-positive.
    pub fn close_price(&self) -> Option<f64> {
        (self.close.is_finite() && self.close > 0.0).then_some(self.close)
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Midnight timestamp for a trading date.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}
