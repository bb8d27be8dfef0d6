//! Moving-average crossover on daily closes.
//!
//! - Golden cross (short SMA crosses above long SMA): buy board lots with
//!   `cash_fraction` of the available cash
//! - Death cross (short SMA crosses below long SMA): sell the whole holding
//! - No cross: do nothing

use super::{Strategy, StrategyContext, StrategyError};
use crate::data::DailyData;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cross {
    Golden,
    Death,
}

#[derive(Debug, Clone)]
pub struct MaCross {
    short_window: usize,
    long_window: usize,
    cash_fraction: f64,
    closes: BTreeMap<String, VecDeque<f64>>,
}

impl MaCross {
    pub fn new(
        short_window: usize,
        long_window: usize,
        cash_fraction: f64,
    ) -> Result<Self, StrategyError> {
        if short_window == 0 {
            return Err(StrategyError::InvalidParam {
                name: "short_window".into(),
                message: "must be > 0".into(),
            });
        }
        if long_window <= short_window {
            return Err(StrategyError::InvalidParam {
                name: "long_window".into(),
                message: format!("must be > short_window ({short_window})"),
            });
        }
        if !(cash_fraction > 0.0 && cash_fraction <= 1.0) {
            return Err(StrategyError::InvalidParam {
                name: "cash_fraction".into(),
                message: "must be in (0, 1]".into(),
            });
        }
        Ok(Self {
            short_window,
            long_window,
            cash_fraction,
            closes: BTreeMap::new(),
        })
    }

    fn sma(closes: &VecDeque<f64>, end: usize, period: usize) -> Option<f64> {
        if end < period {
            return None;
        }
        let sum: f64 = closes.range(end - period..end).sum();
        Some(sum / period as f64)
    }

    /// Cross on the latest close, comparing against one bar ago.
    pub fn detect_cross(&self, closes: &VecDeque<f64>) -> Option<Cross> {
        let n = closes.len();
        if n < self.long_window.saturating_add(1) {
            return None;
        }
        let short_now = Self::sma(closes, n, self.short_window)?;
        let long_now = Self::sma(closes, n, self.long_window)?;
        let short_prev = Self::sma(closes, n - 1, self.short_window)?;
        let long_prev = Self::sma(closes, n - 1, self.long_window)?;

        if short_prev <= long_prev && short_now > long_now {
            Some(Cross::Golden)
        } else if short_prev >= long_prev && short_now < long_now {
            Some(Cross::Death)
        } else {
            None
        }
    }
}

impl Default for MaCross {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            cash_fraction: 0.5,
            closes: BTreeMap::new(),
        }
    }
}

impl Strategy for MaCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn initialize(&mut self, _ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        self.closes.clear();
        Ok(())
    }

    fn handle_data(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        data: &DailyData,
    ) -> Result<(), StrategyError> {
        let securities = ctx.securities().to_vec();
        for security in securities {
            let Some(price) = data.close(&security) else {
                continue;
            };
            let window = self.long_window.saturating_add(1);
            let closes = self.closes.entry(security.clone()).or_default();
            closes.push_back(price);
            if closes.len() > window {
                closes.pop_front();
            }

            let cross = self.closes.get(&security).and_then(|c| self.detect_cross(c));
            let held = ctx.portfolio().held_amount(&security);
            match cross {
                Some(Cross::Golden) if held <= 0.0 => {
                    let budget = ctx.portfolio().cash() * self.cash_fraction;
                    let amount = ctx.affordable_lots(budget, price);
                    if amount > 0.0 {
                        debug!(security = %security, price, amount, "golden cross");
                        ctx.order(&security, amount)?;
                    }
                }
                Some(Cross::Death) if held > 0.0 => {
                    debug!(security = %security, price, held, "death cross");
                    ctx.order(&security, -held)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}
