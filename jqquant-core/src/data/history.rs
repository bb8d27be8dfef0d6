//! Per-date price structure.
//!
//! The provider hands back a flat frame; the engine wants one uniform
//! structure per trading timestamp. `PriceHistory` groups the frame once,
//! up front, into ordered `DailyData` maps keyed by security.

use super::provider::PriceFrame;
use crate::domain::Bar;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::debug;

/// All bars available at one timestamp, keyed by security.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyData {
    timestamp: NaiveDateTime,
    bars: BTreeMap<String, Bar>,
}

impl DailyData {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            bars: BTreeMap::new(),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Insert a bar; a later duplicate for the same security replaces the
    /// earlier one.
    pub fn insert(&mut self, bar: Bar) -> Option<Bar> {
        self.bars.insert(bar.security.clone(), bar)
    }

    pub fn get(&self, security: &str) -> Option<&Bar> {
        self.bars.get(security)
    }

    /// Usable closing price for `security` on this date.
    pub fn close(&self, security: &str) -> Option<f64> {
        self.bars.get(security).and_then(Bar::close_price)
    }

    /// Usable closing prices for every security on this date.
    pub fn closes(&self) -> BTreeMap<String, f64> {
        self.bars
            .iter()
            .filter_map(|(sec, bar)| bar.close_price().map(|p| (sec.clone(), p)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Bar)> {
        self.bars.iter()
    }

    pub fn securities(&self) -> impl Iterator<Item = &str> {
        self.bars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Date-ordered price history for a whole run.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    days: BTreeMap<NaiveDateTime, DailyData>,
}

impl PriceHistory {
    pub fn from_frame(frame: &PriceFrame) -> Self {
        let mut days: BTreeMap<NaiveDateTime, DailyData> = BTreeMap::new();
        for bar in frame.rows() {
            let day = days
                .entry(bar.timestamp)
                .or_insert_with(|| DailyData::new(bar.timestamp));
            if day.insert(bar.clone()).is_some() {
                debug!(security = %bar.security, timestamp = %bar.timestamp, "duplicate bar replaced");
            }
        }
        Self { days }
    }

    /// Trading timestamps in ascending order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.days.keys().copied()
    }

    pub fn get(&self, timestamp: &NaiveDateTime) -> Option<&DailyData> {
        self.days.get(timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyData> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.days.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.days.keys().next_back().copied()
    }
}

/// BLAKE3 content hash over every row of a frame.
///
/// Stable across runs for identical data, so results can be matched to the
/// dataset that produced them.
pub fn dataset_hash(frame: &PriceFrame) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in frame.rows() {
        hasher.update(bar.security.as_bytes());
        hasher.update(bar.timestamp.to_string().as_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
