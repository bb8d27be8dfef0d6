//! Strategy contract and the context a strategy trades through.
//!
//! The engine drives four hooks per run: `initialize` once, then
//! `before_trading_start`, `handle_data` and `after_trading_end` for every
//! date with data. Strategies read state and submit orders only through
//! [`StrategyContext`]; orders are appended to the backlog and settled by
//! the engine later in the same date.

pub mod buy_and_hold;
pub mod factory;
pub mod ma_cross;

pub use buy_and_hold::BuyAndHold;
pub use factory::{strategy_from_name, StrategyParams, STRATEGY_NAMES};
pub use ma_cross::MaCross;

use crate::data::{DailyData, DataProvider};
use crate::domain::{Order, OrderId, Portfolio};
use crate::engine::{CostModel, OrderError, OrderManager};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Board-lot size for A-share orders.
pub const LOT_SIZE: f64 = 100.0;

/// Errors raised from strategy hooks or strategy construction.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("unknown strategy: {0}")]
    Unknown(String),

    #[error("invalid parameter {name}: {message}")]
    InvalidParam { name: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// User-supplied trading logic.
///
/// Every hook but `handle_data` defaults to a no-op.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Called once per run, before the first date, with the securities
    /// and starting portfolio already in place.
    fn initialize(&mut self, _ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        Ok(())
    }

    fn before_trading_start(&mut self, _ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Receives the date's bars; orders submitted here settle at this
    /// date's close.
    fn handle_data(
        &mut self,
        ctx: &mut StrategyContext<'_>,
        data: &DailyData,
    ) -> Result<(), StrategyError>;

    fn after_trading_end(&mut self, _ctx: &mut StrategyContext<'_>) -> Result<(), StrategyError> {
        Ok(())
    }
}

/// Per-hook view of the run: read-only portfolio, the order backlog for
/// submissions, the data provider and the active security list.
pub struct StrategyContext<'a> {
    portfolio: &'a Portfolio,
    orders: &'a mut OrderManager,
    data_provider: &'a dyn DataProvider,
    securities: &'a [String],
    now: NaiveDateTime,
}

impl<'a> StrategyContext<'a> {
    pub fn new(
        portfolio: &'a Portfolio,
        orders: &'a mut OrderManager,
        data_provider: &'a dyn DataProvider,
        securities: &'a [String],
        now: NaiveDateTime,
    ) -> Self {
        Self {
            portfolio,
            orders,
            data_provider,
            securities,
            now,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        self.portfolio
    }

    pub fn data_provider(&self) -> &dyn DataProvider {
        self.data_provider
    }

    pub fn securities(&self) -> &[String] {
        self.securities
    }

    /// Timestamp of the date being processed.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn cost_model(&self) -> &CostModel {
        self.orders.cost_model()
    }

    /// Submit an order for `amount` shares (negative sells).
    pub fn order(&mut self, security: &str, amount: f64) -> Result<OrderId, StrategyError> {
        Ok(self.orders.submit(security, amount, self.now)?)
    }

    /// Submit whatever order moves the held amount to `target`.
    ///
    /// Returns `None` when the position is already at target.
    pub fn order_target(
        &mut self,
        security: &str,
        target: f64,
    ) -> Result<Option<OrderId>, StrategyError> {
        if !(target.is_finite() && target >= 0.0) {
            return Err(OrderError::InvalidAmount {
                security: security.to_string(),
                amount: target,
            }
            .into());
        }
        let delta = target - self.portfolio.held_amount(security);
        if delta.abs() < 1e-9 {
            return Ok(None);
        }
        self.order(security, delta).map(Some)
    }

    /// Orders still waiting for a price, in submission order.
    pub fn pending_orders(&self) -> Vec<&Order> {
        self.orders.pending_orders().collect()
    }

    /// Largest multiple of [`LOT_SIZE`] whose buy cost (slippage and
    /// commission included) fits in `cash` at `price`.
    pub fn affordable_lots(&self, cash: f64, price: f64) -> f64 {
        let cost = self.cost_model();
        let unit = cost.fill_price(price, crate::domain::OrderSide::Buy) * (1.0 + cost.commission_rate);
        if !(unit > 0.0 && cash > 0.0) {
            return 0.0;
        }
        (cash / unit / LOT_SIZE).floor() * LOT_SIZE
    }
}
