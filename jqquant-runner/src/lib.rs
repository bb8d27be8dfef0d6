//! jqquant runner: configuration, orchestration and artifact export.
//!
//! This crate builds on `jqquant-core` to provide:
//! - TOML configuration with validation and a content-hash run ID
//! - Provider and strategy wiring from config
//! - Single-run orchestration
//! - JSON / CSV / Markdown artifacts

pub mod config;
pub mod export;
pub mod runner;

pub use config::{AppConfig, ConfigError, DataSource, RunId};
pub use export::{
    export_equity_csv, export_json, export_trades_csv, generate_report, import_json,
    load_artifacts, save_artifacts, summary_table,
};
pub use jqquant_core::engine::{BacktestResult, SCHEMA_VERSION};
pub use runner::{build_provider, run_backtest, run_backtest_with_provider, RunError};
