//! Backtest engine: drives a strategy through the price history one date
//! at a time.
//!
//! A run fetches the whole date range up front, groups it into per-date
//! [`DailyData`], then runs the seven-step pipeline for each date. A date
//! that fails is logged, recorded in the diagnostics list and skipped; only
//! configuration problems (no strategy, no data, bad inputs) abort a run.

use super::cost_model::CostModel;
use super::order_manager::{OrderError, OrderManager};
use super::result::{BacktestResult, DayOutcome, DayStatus, SkipReason, SCHEMA_VERSION};
use super::settlement;
use crate::data::{dataset_hash, DailyData, DataError, DataProvider, PriceHistory};
use crate::domain::{midnight, Frequency, Portfolio, PortfolioError, TradeRecord};
use crate::metrics::{return_series, sort_trades, Metrics};
use crate::strategy::{Strategy, StrategyContext, StrategyError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Cash and friction settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub slippage: f64,
}

impl EngineConfig {
    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.commission_rate, self.slippage)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "initial_cash must be > 0, got {}",
                self.initial_cash
            )));
        }
        for (name, v) in [
            ("commission_rate", self.commission_rate),
            ("slippage", self.slippage),
        ] {
            if !(0.0..1.0).contains(&v) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be in [0, 1), got {v}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            commission_rate: 0.0003,
            slippage: 0.001,
        }
    }
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No strategy attached yet.
    Unconfigured,
    Configured,
    Running,
    Completed,
}

/// Errors that abort a run before any date is processed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no strategy attached; call set_strategy before run")]
    NoStrategy,

    #[error("no securities requested")]
    NoSecurities,

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("no price data for {securities:?} between {start} and {end}")]
    EmptyDataset {
        securities: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("data provider failed: {0}")]
    Data(#[from] DataError),

    #[error("strategy {name} failed to initialize: {source}")]
    Initialize {
        name: String,
        #[source]
        source: StrategyError,
    },
}

/// Failure inside a single date's pipeline.
#[derive(Debug, Error)]
pub enum DayError {
    #[error("strategy hook failed: {0}")]
    Strategy(#[from] StrategyError),

    #[error("order handling failed: {0}")]
    Order(#[from] OrderError),

    #[error("settlement failed: {0}")]
    Portfolio(#[from] PortfolioError),
}

/// Per-run counters for the end-of-run log line.
#[derive(Debug, Default, Clone, Copy)]
struct SettleStats {
    filled: usize,
    rejected: usize,
    carried: usize,
}

pub struct BacktestEngine {
    provider: Arc<dyn DataProvider>,
    config: EngineConfig,
    strategy: Option<Box<dyn Strategy>>,
    portfolio: Portfolio,
    orders: OrderManager,
    state: EngineState,
}

impl BacktestEngine {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        initial_cash: f64,
        commission_rate: f64,
        slippage: f64,
    ) -> Self {
        Self::with_config(
            provider,
            EngineConfig {
                initial_cash,
                commission_rate,
                slippage,
            },
        )
    }

    pub fn with_config(provider: Arc<dyn DataProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            config,
            strategy: None,
            portfolio: Portfolio::new(config.initial_cash),
            orders: OrderManager::new(config.cost_model()),
            state: EngineState::Unconfigured,
        }
    }

    /// Attach (or replace) the strategy.
    pub fn set_strategy(&mut self, strategy: Box<dyn Strategy>) {
        debug!(strategy = strategy.name(), "strategy attached");
        self.strategy = Some(strategy);
        self.state = EngineState::Configured;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ledger of the most recent run (or the untouched starting ledger).
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Order backlog of the most recent run.
    pub fn order_manager(&self) -> &OrderManager {
        &self.orders
    }

    /// Run the attached strategy over `[start, end]`.
    ///
    /// Each run starts from a fresh portfolio and order backlog, so an
    /// engine can be run again with a different range.
    pub fn run(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        securities: &[String],
        frequency: Frequency,
    ) -> Result<BacktestResult, EngineError> {
        let mut strategy = self.strategy.take().ok_or(EngineError::NoStrategy)?;
        let result = self.run_strategy(strategy.as_mut(), start, end, securities, frequency);
        self.strategy = Some(strategy);
        if result.is_err() {
            self.state = EngineState::Configured;
        }
        result
    }

    fn run_strategy(
        &mut self,
        strategy: &mut dyn Strategy,
        start: NaiveDate,
        end: NaiveDate,
        securities: &[String],
        frequency: Frequency,
    ) -> Result<BacktestResult, EngineError> {
        self.config.validate()?;
        if start > end {
            return Err(EngineError::InvalidRange { start, end });
        }
        if securities.is_empty() {
            return Err(EngineError::NoSecurities);
        }

        let frame = self
            .provider
            .get_price_data(securities, start, end, frequency)?;
        if frame.is_empty() {
            return Err(EngineError::EmptyDataset {
                securities: securities.to_vec(),
                start,
                end,
            });
        }
        let hash = dataset_hash(&frame);
        let history = PriceHistory::from_frame(&frame);

        info!(
            strategy = strategy.name(),
            provider = self.provider.name(),
            %start,
            %end,
            %frequency,
            securities = securities.len(),
            dates = history.len(),
            rows = frame.len(),
            "backtest started"
        );

        self.portfolio = Portfolio::new(self.config.initial_cash);
        self.orders = OrderManager::new(self.config.cost_model());
        self.state = EngineState::Running;

        let first = history
            .first_timestamp()
            .unwrap_or_else(|| midnight(start));
        {
            let mut ctx = StrategyContext::new(
                &self.portfolio,
                &mut self.orders,
                self.provider.as_ref(),
                securities,
                first,
            );
            strategy
                .initialize(&mut ctx)
                .map_err(|source| EngineError::Initialize {
                    name: strategy.name().to_string(),
                    source,
                })?;
        }

        let mut stats = SettleStats::default();
        let mut diagnostics = Vec::with_capacity(history.len());
        for day in history.iter() {
            let status = match self.process_day(strategy, day, securities, &mut stats) {
                Ok(status) => status,
                Err(e) => {
                    error!(date = %day.timestamp(), error = %e, "date failed; skipping");
                    DayStatus::Failed(e.to_string())
                }
            };
            diagnostics.push(DayOutcome {
                timestamp: day.timestamp(),
                status,
            });
        }

        self.state = EngineState::Completed;
        let result = self.build_result(
            strategy.name(),
            start,
            end,
            securities,
            frequency,
            hash,
            diagnostics,
        );
        info!(
            strategy = %result.strategy,
            total_value = result.summary.total_value,
            total_return = result.metrics.total_return,
            sharpe = result.metrics.sharpe_ratio,
            max_drawdown = result.metrics.max_drawdown,
            filled = stats.filled,
            rejected = stats.rejected,
            still_pending = self.orders.pending_ids().len(),
            carried_over = stats.carried,
            failed_dates = result.failed_dates(),
            "backtest completed"
        );
        Ok(result)
    }

    fn process_day(
        &mut self,
        strategy: &mut dyn Strategy,
        day: &DailyData,
        securities: &[String],
        stats: &mut SettleStats,
    ) -> Result<DayStatus, DayError> {
        let now = day.timestamp();
        if day.is_empty() {
            warn!(date = %now, "no bars for date; skipping");
            return Ok(DayStatus::Skipped(SkipReason::NoData));
        }

        {
            let mut ctx = StrategyContext::new(
                &self.portfolio,
                &mut self.orders,
                self.provider.as_ref(),
                securities,
                now,
            );
            strategy.before_trading_start(&mut ctx)?;
            strategy.handle_data(&mut ctx, day)?;
        }

        self.settle_pending(day, stats)?;
        self.portfolio.update_prices(&day.closes());

        {
            let mut ctx = StrategyContext::new(
                &self.portfolio,
                &mut self.orders,
                self.provider.as_ref(),
                securities,
                now,
            );
            strategy.after_trading_end(&mut ctx)?;
        }

        self.portfolio.record(now);
        Ok(DayStatus::Processed)
    }

    /// Settle every pending order against the date's closes.
    ///
    /// Orders without a usable price stay pending. Orders the ledger can't
    /// cover are rejected and leave cash and positions untouched.
    fn settle_pending(&mut self, day: &DailyData, stats: &mut SettleStats) -> Result<(), DayError> {
        let now = day.timestamp();
        for id in self.orders.pending_ids() {
            let Some(order) = self.orders.get_order(id) else {
                continue;
            };
            let Some(price) = day.close(&order.security) else {
                debug!(order_id = %id, security = %order.security, date = %now, "no price; order stays pending");
                stats.carried += 1;
                continue;
            };

            let quote = self.orders.quote(id, price)?;
            if let Err(shortfall) = settlement::check_fill(order, &quote, &self.portfolio) {
                warn!(
                    order_id = %id,
                    security = %order.security,
                    amount = order.amount,
                    reason = %shortfall,
                    "order rejected"
                );
                self.orders.reject(id, shortfall.to_string())?;
                stats.rejected += 1;
                continue;
            }

            if !self.orders.process_order(id, price, now)? {
                stats.carried += 1;
                continue;
            }
            let order = self.orders.get_order(id).ok_or(OrderError::NotFound(id))?;
            let commission = self.orders.get_commission(order);
            settlement::apply_fill(order, commission, &mut self.portfolio)?;
            stats.filled += 1;
            info!(
                order_id = %id,
                security = %order.security,
                side = %order.side(),
                amount = order.abs_amount(),
                price = quote.price,
                commission,
                cash = self.portfolio.cash(),
                "order filled"
            );
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn build_result(
        &self,
        strategy: &str,
        start: NaiveDate,
        end: NaiveDate,
        securities: &[String],
        frequency: Frequency,
        dataset_hash: String,
        diagnostics: Vec<DayOutcome>,
    ) -> BacktestResult {
        let trades: Vec<TradeRecord> = self
            .orders
            .get_filled_orders()
            .into_iter()
            .filter_map(|o| TradeRecord::from_filled_order(o, self.orders.get_commission(o)))
            .collect();
        let trade_history = sort_trades(trades);

        let summary = self.portfolio.get_summary();
        let values: Vec<f64> = self.portfolio.total_value_history().collect();
        let metrics = Metrics::compute(summary.total_profit_rate, &values, trade_history.len());

        BacktestResult {
            schema_version: SCHEMA_VERSION,
            strategy: strategy.to_string(),
            securities: securities.to_vec(),
            frequency,
            start,
            end,
            benchmark: None,
            initial_cash: self.config.initial_cash,
            commission_rate: self.config.commission_rate,
            slippage: self.config.slippage,
            dataset_hash,
            summary,
            metrics,
            portfolio_history: self.portfolio.history().to_vec(),
            returns: return_series(self.portfolio.history()),
            trade_history,
            final_positions: self.portfolio.open_positions().cloned().collect(),
            rejected_orders: self.orders.rejected_count(),
            diagnostics,
        }
    }
}
