//! jqquant CLI: run backtests and inspect saved results.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config, with flag overrides
//! - `report`: print the summary of a saved run directory
//! - `strategies`: list the built-in strategies

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use jqquant_core::domain::Frequency;
use jqquant_core::strategy::STRATEGY_NAMES;
use jqquant_runner::{
    load_artifacts, run_backtest, save_artifacts, summary_table, AppConfig, DataSource,
};

#[derive(Parser)]
#[command(name = "jqquant", about = "jqquant CLI: event-driven backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest. Flags override values from --config.
    Run(RunArgs),
    /// Print the summary of a saved run directory.
    Report {
        /// Run directory written by `run`.
        dir: PathBuf,

        /// Print the full Markdown report instead of the summary table.
        #[arg(long, default_value_t = false)]
        full: bool,
    },
    /// List the built-in strategies.
    Strategies,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy name (see `jqquant strategies`).
    #[arg(long)]
    strategy: Option<String>,

    /// Strategy parameter as key=value. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Start date (YYYY-MM-DD). Defaults to one year before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Securities to trade (e.g., 000001.XSHE 600000.XSHG).
    #[arg(long, num_args = 1..)]
    securities: Vec<String>,

    /// Bar frequency: daily, 1m, 5m, 15m, 30m, 60m.
    #[arg(long)]
    frequency: Option<String>,

    /// Directory of per-security CSV files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use seeded synthetic prices instead of CSV files.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for synthetic prices.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    initial_cash: Option<f64>,

    #[arg(long)]
    commission_rate: Option<f64>,

    #[arg(long)]
    slippage: Option<f64>,

    /// Output directory for run artifacts.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Print the summary without writing artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_backtest_cmd(args),
        Commands::Report { dir, full } => run_report(&dir, full),
        Commands::Strategies => {
            for name in STRATEGY_NAMES {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_backtest_cmd(args: RunArgs) -> Result<()> {
    let no_save = args.no_save;
    let config = build_config(args)?;
    config.validate()?;

    ensure_dirs(&config, no_save)?;
    let _guard = init_logging(&config.paths.logs_dir)?;

    info!(
        strategy = %config.strategy.name,
        securities = config.backtest.securities.len(),
        "run requested"
    );

    let result = run_backtest(&config)?;

    println!();
    println!("=== Backtest Result ===");
    print!("{}", summary_table(&result));
    println!();

    if !no_save {
        let run_dir = save_artifacts(&result, &config.paths.results_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

/// Load the config file (if any) and apply flag overrides on top.
fn build_config(args: RunArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = args.strategy {
        config.strategy.name = name;
    }
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        config.strategy.params.insert(key, value);
    }

    if let Some(end) = args.end.as_deref() {
        config.backtest.end_date = Some(parse_date(end)?);
    }
    let end = *config
        .backtest
        .end_date
        .get_or_insert_with(|| chrono::Local::now().date_naive());
    if let Some(start) = args.start.as_deref() {
        config.backtest.start_date = Some(parse_date(start)?);
    }
    if config.backtest.start_date.is_none() {
        config.backtest.start_date = Some(end - chrono::Duration::days(365));
    }

    if !args.securities.is_empty() {
        config.backtest.securities = args.securities;
    }
    if let Some(freq) = args.frequency.as_deref() {
        config.backtest.frequency = freq.parse::<Frequency>()?;
    }
    if let Some(cash) = args.initial_cash {
        config.backtest.initial_cash = cash;
    }
    if let Some(rate) = args.commission_rate {
        config.backtest.commission_rate = rate;
    }
    if let Some(slip) = args.slippage {
        config.backtest.slippage = slip;
    }

    if args.synthetic {
        config.data.source = DataSource::Synthetic;
    }
    if let Some(seed) = args.seed {
        config.data.seed = seed;
    }
    if let Some(dir) = args.data_dir {
        config.data.dir = Some(dir);
    }
    if let Some(dir) = args.results_dir {
        config.paths.results_dir = dir;
    }

    Ok(config)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn parse_param(raw: &str) -> Result<(String, f64)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("invalid --param '{raw}', expected KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("invalid --param '{raw}': empty key");
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid --param '{raw}': value is not a number"))?;
    Ok((key.to_string(), value))
}

/// Create the log and results directories before anything writes to them.
fn ensure_dirs(config: &AppConfig, no_save: bool) -> Result<()> {
    std::fs::create_dir_all(&config.paths.logs_dir).with_context(|| {
        format!(
            "failed to create logs dir {}",
            config.paths.logs_dir.display()
        )
    })?;
    if !no_save {
        std::fs::create_dir_all(&config.paths.results_dir).with_context(|| {
            format!(
                "failed to create results dir {}",
                config.paths.results_dir.display()
            )
        })?;
    }
    Ok(())
}

/// Stdout plus a daily-rotated file under `logs_dir`. `RUST_LOG` overrides
/// the default `jqquant=info` filter. The guard must live until exit or
/// buffered file lines are lost.
fn init_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new("jqquant=info"),
    };

    let file_appender = RollingFileAppender::new(Rotation::DAILY, logs_dir, "jqquant.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn run_report(dir: &Path, full: bool) -> Result<()> {
    let result = load_artifacts(dir)?;
    if full {
        print!("{}", jqquant_runner::generate_report(&result));
    } else {
        print!("{}", summary_table(&result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            strategy: None,
            params: Vec::new(),
            start: None,
            end: None,
            securities: Vec::new(),
            frequency: None,
            data_dir: None,
            synthetic: false,
            seed: None,
            initial_cash: None,
            commission_rate: None,
            slippage: None,
            results_dir: None,
            no_save: true,
        }
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "jqquant",
            "run",
            "--strategy",
            "ma_cross",
            "--param",
            "short_window=3",
            "--param",
            "long_window=10",
            "--securities",
            "000001.XSHE",
            "600000.XSHG",
            "--synthetic",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(a) => {
                assert_eq!(a.strategy.as_deref(), Some("ma_cross"));
                assert_eq!(a.params.len(), 2);
                assert_eq!(a.securities.len(), 2);
                assert!(a.synthetic);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn param_parsing() {
        assert_eq!(
            parse_param("short_window=5").unwrap(),
            ("short_window".to_string(), 5.0)
        );
        assert_eq!(
            parse_param(" cash_fraction = 0.25 ").unwrap(),
            ("cash_fraction".to_string(), 0.25)
        );
        assert!(parse_param("no_equals").is_err());
        assert!(parse_param("=1").is_err());
        assert!(parse_param("k=abc").is_err());
    }

    #[test]
    fn default_range_is_one_year_back_from_end() {
        let mut a = args();
        a.end = Some("2024-06-30".into());
        a.securities = vec!["000001.XSHE".into()];
        let cfg = build_config(a).unwrap();
        assert_eq!(cfg.backtest.end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(cfg.backtest.start_date, NaiveDate::from_ymd_opt(2023, 7, 1));
    }

    #[test]
    fn flags_override_defaults() {
        let mut a = args();
        a.start = Some("2023-01-01".into());
        a.end = Some("2023-12-31".into());
        a.securities = vec!["600000.XSHG".into()];
        a.strategy = Some("ma_cross".into());
        a.params = vec!["long_window=30".into()];
        a.initial_cash = Some(50_000.0);
        a.commission_rate = Some(0.0);
        a.synthetic = true;
        a.seed = Some(7);
        a.frequency = Some("daily".into());

        let cfg = build_config(a).unwrap();
        assert_eq!(cfg.strategy.name, "ma_cross");
        assert_eq!(cfg.strategy.params.get("long_window"), Some(&30.0));
        assert_eq!(cfg.backtest.initial_cash, 50_000.0);
        assert_eq!(cfg.backtest.commission_rate, 0.0);
        assert_eq!(cfg.data.source, DataSource::Synthetic);
        assert_eq!(cfg.data.seed, 7);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_date_and_frequency_rejected() {
        let mut a = args();
        a.start = Some("2023/01/01".into());
        assert!(build_config(a).is_err());

        let mut a = args();
        a.frequency = Some("weekly".into());
        assert!(build_config(a).is_err());
    }
}
