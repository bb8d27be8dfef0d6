//! Seeded random-walk provider for demos and smoke tests.
//!
//! Daily bars fall on weekdays. Intraday bars follow the exchange sessions
//! 09:30-11:30 and 13:00-15:00, stamped at each bar's close.

use super::provider::{check_range, DataError, DataProvider, PriceFrame};
use crate::domain::{midnight, Bar, Frequency};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generates deterministic price paths: the same seed, security list and
/// range always produce the same rows.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    /// Per-bar drift of the log price.
    drift: f64,
    /// Per-bar volatility of the log price.
    volatility: f64,
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 10.0,
            drift: 0.0003,
            volatility: 0.02,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    fn timeline(start: NaiveDate, end: NaiveDate, frequency: Frequency) -> Vec<NaiveDateTime> {
        let mut out = Vec::new();
        let mut day = start;
        while day <= end {
            if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                match frequency.minutes() {
                    None => out.push(midnight(day)),
                    Some(step) => {
                        for (open, close) in SESSIONS {
                            let mut t = day.and_time(session_time(open)) + Duration::minutes(step);
                            let session_end = day.and_time(session_time(close));
                            while t <= session_end {
                                out.push(t);
                                t += Duration::minutes(step);
                            }
                        }
                    }
                }
            }
            day += Duration::days(1);
        }
        out
    }

    fn generate(&self, security: &str, index: u64, timeline: &[NaiveDateTime]) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index.wrapping_mul(0x9E37_79B9)));
        let mut close = self.start_price;
        // Uniform shocks scaled to unit variance.
        let scale = self.volatility * 3.0_f64.sqrt();
        timeline
            .iter()
            .map(|&timestamp| {
                let open = close;
                let shock: f64 = rng.gen_range(-1.0..1.0);
                close = (open * (self.drift + shock * scale).exp()).max(0.01);
                let wick: f64 = rng.gen_range(0.0..0.5);
                let high = open.max(close) * (1.0 + wick * self.volatility);
                let low = open.min(close) * (1.0 - wick * self.volatility);
                let volume = rng.gen_range(100_000.0..1_000_000.0_f64).round();
                Bar {
                    security: security.to_string(),
                    timestamp,
                    open: round2(open),
                    high: round2(high),
                    low: round2(low),
                    close: round2(close),
                    volume,
                }
            })
            .collect()
    }
}

const SESSIONS: [((u32, u32), (u32, u32)); 2] = [((9, 30), (11, 30)), ((13, 0), (15, 0))];

fn session_time((h, m): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn get_price_data(
        &self,
        securities: &[String],
        start: NaiveDate,
        end: NaiveDate,
        frequency: Frequency,
    ) -> Result<PriceFrame, DataError> {
        check_range(start, end)?;
        let timeline = Self::timeline(start, end, frequency);
        let rows = securities
            .iter()
            .enumerate()
            .flat_map(|(i, sec)| self.generate(sec, i as u64, &timeline))
            .collect();
        Ok(PriceFrame::new(rows))
    }
}
