//! jqquant core: backtest engine, domain types, data providers and strategies.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, orders, positions, portfolio ledger, trade records)
//! - Data-provider contract plus CSV, synthetic and in-memory providers
//! - Order manager with a slippage/commission fill model
//! - Per-date event loop with settlement and diagnostics
//! - Strategy contract, strategy context and bundled strategies
//! - Return series and performance metrics

pub mod data;
pub mod domain;
pub mod engine;
pub mod metrics;
pub mod strategy;

pub use engine::{BacktestEngine, BacktestResult, EngineConfig, EngineError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a run hands across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::TradeRecord>();
        require_sync::<domain::TradeRecord>();
        require_send::<data::PriceHistory>();
        require_sync::<data::PriceHistory>();
        require_send::<engine::OrderManager>();
        require_sync::<engine::OrderManager>();
        require_send::<engine::BacktestResult>();
        require_sync::<engine::BacktestResult>();

        // The engine moves to a worker thread with its strategy attached.
        require_send::<engine::BacktestEngine>();
    }
}
