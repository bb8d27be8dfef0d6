//! Backtesting engine: order handling, settlement, and the per-date loop.
//!
//! For every date with data the loop runs, in order:
//!
//! 1. Skip the date if it carries no bars
//! 2. Strategy `before_trading_start`
//! 3. Strategy `handle_data` (may submit orders)
//! 4. Settle pending orders at the date's close (reject what the ledger can't cover)
//! 5. Mark positions to the date's closes
//! 6. Strategy `after_trading_end`
//! 7. Record the portfolio snapshot

pub mod backtest;
pub mod cost_model;
pub mod order_manager;
pub mod result;
pub mod settlement;

pub use backtest::{BacktestEngine, DayError, EngineConfig, EngineError, EngineState};
pub use cost_model::CostModel;
pub use order_manager::{FillQuote, OrderError, OrderManager};
pub use result::{BacktestResult, DayOutcome, DayStatus, SkipReason, SCHEMA_VERSION};
pub use settlement::{apply_fill, check_fill};
