//! Portfolio: cash, positions, and the per-date valuation history.

use super::position::Position;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Ledger errors. All of them leave the portfolio untouched.
#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("invalid fill for {security}: amount={amount}, price={price} (both must be > 0)")]
    InvalidFill {
        security: String,
        amount: f64,
        price: f64,
    },

    #[error("insufficient cash: need {required:.2}, have {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("insufficient position in {security}: need {required}, hold {held}")]
    InsufficientPosition {
        security: String,
        required: f64,
        held: f64,
    },

    #[error("invalid cash amount: {0}")]
    InvalidCashAmount(f64),
}

/// One recorded valuation point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub timestamp: NaiveDateTime,
    pub total_value: f64,
    pub cash: f64,
}

/// Headline numbers as of the latest record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub initial_cash: f64,
    pub cash: f64,
    pub total_value: f64,
    /// `total_value / initial_cash - 1`.
    pub total_profit_rate: f64,
}

/// Cash plus positions, with one snapshot recorded per trading date.
///
/// Accounting identity at every snapshot:
/// `total_value == cash + sum(amount * last_price)` over open positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    positions: BTreeMap<String, Position>,
    history: Vec<PortfolioSnapshot>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            positions: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Remove cash from the ledger. Fails rather than going negative.
    pub fn withdraw(&mut self, amount: f64) -> Result<(), PortfolioError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PortfolioError::InvalidCashAmount(amount));
        }
        if amount > self.cash {
            return Err(PortfolioError::InsufficientCash {
                required: amount,
                available: self.cash,
            });
        }
        self.cash -= amount;
        Ok(())
    }

    pub fn deposit(&mut self, amount: f64) -> Result<(), PortfolioError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PortfolioError::InvalidCashAmount(amount));
        }
        self.cash += amount;
        Ok(())
    }

    /// Overwrite `last_price` for every known position present in `prices`.
    ///
    /// Unknown securities are ignored; positions absent from `prices` keep
    /// their previous mark.
    pub fn update_prices(&mut self, prices: &BTreeMap<String, f64>) {
        for (security, &price) in prices {
            if let Some(pos) = self.positions.get_mut(security) {
                pos.last_price = price;
            }
        }
    }

    /// Apply a buy fill: open a position or average into the existing one.
    pub fn add_position(
        &mut self,
        security: &str,
        amount: f64,
        price: f64,
    ) -> Result<(), PortfolioError> {
        if !(amount > 0.0 && price > 0.0 && amount.is_finite() && price.is_finite()) {
            return Err(PortfolioError::InvalidFill {
                security: security.to_string(),
                amount,
                price,
            });
        }

        match self.positions.get_mut(security) {
            Some(pos) if !pos.is_closed() => {
                let total_cost = pos.cost_basis * pos.amount + price * amount;
                let total_amount = pos.amount + amount;
                pos.cost_basis = total_cost / total_amount;
                pos.amount = total_amount;
                pos.last_price = price;
            }
            Some(pos) => {
                // Reopening a closed record: realized PnL carries over.
                pos.amount = amount;
                pos.cost_basis = price;
                pos.last_price = price;
            }
            None => {
                self.positions
                    .insert(security.to_string(), Position::new(security, amount, price));
            }
        }
        Ok(())
    }

    /// Apply a sell fill. Cost basis of the remainder is unchanged; the sale
    /// only moves realized PnL. A position sold down to zero stays as closed.
    pub fn remove_position(
        &mut self,
        security: &str,
        amount: f64,
        price: f64,
    ) -> Result<(), PortfolioError> {
        if !(amount > 0.0 && price > 0.0 && amount.is_finite() && price.is_finite()) {
            return Err(PortfolioError::InvalidFill {
                security: security.to_string(),
                amount,
                price,
            });
        }
        let held = self.held_amount(security);
        let Some(pos) = self.positions.get_mut(security).filter(|_| amount <= held) else {
            return Err(PortfolioError::InsufficientPosition {
                security: security.to_string(),
                required: amount,
                held,
            });
        };

        pos.realized_pnl += (price - pos.cost_basis) * amount;
        pos.amount -= amount;
        if pos.amount <= 1e-9 {
            pos.amount = 0.0;
        }
        Ok(())
    }

    /// Position record for a security, open or closed.
    pub fn get_position(&self, security: &str) -> Option<&Position> {
        self.positions.get(security)
    }

    /// Held amount, zero when there is no record.
    pub fn held_amount(&self, security: &str) -> f64 {
        self.positions.get(security).map_or(0.0, |p| p.amount)
    }

    /// All position records, ordered by security.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Positions with a non-zero amount.
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values().filter(|p| !p.is_closed())
    }

    /// Sum of `amount * last_price` over open positions.
    pub fn positions_value(&self) -> f64 {
        self.open_positions().map(Position::market_value).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.cash + self.positions_value()
    }

    /// Append a valuation snapshot for `timestamp`.
    ///
    /// Call once per trading date after that date's fills and marks.
    pub fn record(&mut self, timestamp: NaiveDateTime) -> PortfolioSnapshot {
        let snapshot = PortfolioSnapshot {
            timestamp,
            total_value: self.total_value(),
            cash: self.cash,
        };
        debug_assert!(
            (snapshot.total_value - (snapshot.cash + self.positions_value())).abs() < 1e-6,
            "portfolio accounting violated at {timestamp}"
        );
        self.history.push(snapshot);
        snapshot
    }

    pub fn history(&self) -> &[PortfolioSnapshot] {
        &self.history
    }

    pub fn date_history(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.history.iter().map(|s| s.timestamp)
    }

    pub fn total_value_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().map(|s| s.total_value)
    }

    pub fn cash_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().map(|s| s.cash)
    }

    /// Summary as of the latest snapshot, or of the live ledger before the
    /// first `record`.
    pub fn get_summary(&self) -> PortfolioSummary {
        let (cash, total_value) = match self.history.last() {
            Some(s) => (s.cash, s.total_value),
            None => (self.cash, self.total_value()),
        };
        let total_profit_rate = if self.initial_cash > 0.0 {
            total_value / self.initial_cash - 1.0
        } else {
            0.0
        };
        PortfolioSummary {
            initial_cash: self.initial_cash,
            cash,
            total_value,
            total_profit_rate,
        }
    }
}
