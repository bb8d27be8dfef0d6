//! Serializable run configuration, loaded from TOML.
//!
//! One explicit struct carries everything a run needs: cash and friction,
//! the date range and universe, the strategy and its parameters, where the
//! data comes from and where artifacts and logs go. Nothing is read from
//! process-wide state.

use chrono::NaiveDate;
use jqquant_core::domain::Frequency;
use jqquant_core::engine::EngineConfig;
use jqquant_core::strategy::StrategyParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Content hash of a config, for tagging artifacts.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration. Every section and field has a default, so an
/// empty file is a valid (if incomplete) config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    pub data: DataSection,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub slippage: f64,
    /// Recorded in results; no benchmark series is fetched.
    pub benchmark: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub securities: Vec<String>,
    pub frequency: Frequency,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            commission_rate: 0.0003,
            slippage: 0.001,
            benchmark: "000300.XSHG".into(),
            start_date: None,
            end_date: None,
            securities: Vec::new(),
            frequency: Frequency::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub name: String,
    pub params: StrategyParams,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            name: "buy_and_hold".into(),
            params: StrategyParams::new(),
        }
    }
}

/// Where price data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Per-security CSV files.
    #[default]
    Csv,
    /// Seeded random walk; for demos and smoke runs.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub source: DataSource,
    /// CSV directory; falls back to `paths.data_dir`.
    pub dir: Option<PathBuf>,
    pub seed: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            source: DataSource::Csv,
            dir: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Check everything a run needs is present and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if !(bt.initial_cash.is_finite() && bt.initial_cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "backtest.initial_cash must be > 0, got {}",
                bt.initial_cash
            )));
        }
        for (name, v) in [
            ("backtest.commission_rate", bt.commission_rate),
            ("backtest.slippage", bt.slippage),
        ] {
            if !(0.0..1.0).contains(&v) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be in [0, 1), got {v}"
                )));
            }
        }
        let (start, end) = self.date_range()?;
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "backtest.start_date {start} is after backtest.end_date {end}"
            )));
        }
        if bt.securities.is_empty() {
            return Err(ConfigError::Invalid(
                "backtest.securities must list at least one security".into(),
            ));
        }
        if self.strategy.name.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy.name is empty".into()));
        }
        Ok(())
    }

    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), ConfigError> {
        let start = self
            .backtest
            .start_date
            .ok_or_else(|| ConfigError::Invalid("backtest.start_date is not set".into()))?;
        let end = self
            .backtest
            .end_date
            .ok_or_else(|| ConfigError::Invalid("backtest.end_date is not set".into()))?;
        Ok((start, end))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_cash: self.backtest.initial_cash,
            commission_rate: self.backtest.commission_rate,
            slippage: self.backtest.slippage,
        }
    }

    /// Directory CSV files are read from.
    pub fn csv_dir(&self) -> &Path {
        self.data.dir.as_deref().unwrap_or(&self.paths.data_dir)
    }

    /// Deterministic BLAKE3 hash of the config.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("config is not serializable: {e}")))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
