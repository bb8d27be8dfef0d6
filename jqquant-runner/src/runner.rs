//! Single-run orchestration: wire the provider and strategy named in an
//! [`AppConfig`] into a [`BacktestEngine`] and run it.

use std::sync::Arc;

use jqquant_core::data::{CsvProvider, DataProvider, SyntheticProvider};
use jqquant_core::engine::{BacktestEngine, BacktestResult, EngineError};
use jqquant_core::strategy::{strategy_from_name, StrategyError};
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, ConfigError, DataSource};

/// Errors from the runner layer.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("backtest failed: {0}")]
    Engine(#[from] EngineError),
}

/// Build the data provider the config selects.
pub fn build_provider(config: &AppConfig) -> Arc<dyn DataProvider> {
    match config.data.source {
        DataSource::Csv => Arc::new(CsvProvider::new(config.csv_dir())),
        DataSource::Synthetic => Arc::new(SyntheticProvider::new(config.data.seed)),
    }
}

/// Validate the config, build provider and strategy, and run one backtest.
pub fn run_backtest(config: &AppConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let provider = build_provider(config);
    run_backtest_with_provider(config, provider)
}

/// Run one backtest against an explicit provider; the config's `[data]`
/// section is ignored.
pub fn run_backtest_with_provider(
    config: &AppConfig,
    provider: Arc<dyn DataProvider>,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let (start, end) = config.date_range()?;
    let strategy = strategy_from_name(&config.strategy.name, &config.strategy.params)?;

    info!(
        run_id = %config.run_id()?,
        provider = provider.name(),
        strategy = %config.strategy.name,
        "starting run"
    );

    let mut engine = BacktestEngine::with_config(provider, config.engine_config());
    engine.set_strategy(strategy);
    let mut result = engine.run(
        start,
        end,
        &config.backtest.securities,
        config.backtest.frequency,
    )?;
    result.benchmark = Some(config.backtest.benchmark.clone());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use jqquant_core::data::InMemoryProvider;
    use jqquant_core::domain::{midnight, Bar};

    fn config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.backtest.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        cfg.backtest.end_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        cfg.backtest.securities = vec!["A".into()];
        cfg
    }

    fn provider() -> Arc<dyn DataProvider> {
        let rows = (2..=10)
            .map(|d| {
                let close = 10.0 + d as f64;
                Bar {
                    security: "A".into(),
                    timestamp: midnight(NaiveDate::from_ymd_opt(2024, 1, d).unwrap()),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect();
        Arc::new(InMemoryProvider::new(rows))
    }

    #[test]
    fn runs_buy_and_hold_from_config() {
        let result = run_backtest_with_provider(&config(), provider()).unwrap();
        assert_eq!(result.strategy, "buy_and_hold");
        assert_eq!(result.benchmark.as_deref(), Some("000300.XSHG"));
        assert_eq!(result.portfolio_history.len(), 9);
        assert_eq!(result.trade_history.len(), 1);
        assert!(result.metrics.total_return > 0.0);
    }

    #[test]
    fn unknown_strategy_is_reported() {
        let mut cfg = config();
        cfg.strategy.name = "nope".into();
        let err = run_backtest_with_provider(&cfg, provider()).unwrap_err();
        assert!(matches!(err, RunError::Strategy(StrategyError::Unknown(_))));
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut cfg = config();
        cfg.backtest.securities.clear();
        assert!(matches!(
            run_backtest_with_provider(&cfg, provider()),
            Err(RunError::Config(_))
        ));
    }

    #[test]
    fn empty_csv_directory_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.data.dir = Some(dir.path().to_path_buf());
        let err = run_backtest(&cfg).unwrap_err();
        assert!(matches!(
            err,
            RunError::Engine(EngineError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn synthetic_source_runs() {
        let mut cfg = config();
        cfg.data.source = DataSource::Synthetic;
        let result = run_backtest(&cfg).unwrap();
        assert!(!result.portfolio_history.is_empty());
        assert!(!result.dataset_hash.is_empty());
    }
}
