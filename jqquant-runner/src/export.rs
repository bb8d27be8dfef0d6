//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade ledger and per-date value curve for external tools
//! - **Markdown**: human-readable single-run report
//!
//! Persisted manifests carry a `schema_version`; newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use jqquant_core::domain::TradeRecord;
use jqquant_core::engine::{BacktestResult, DayStatus, SCHEMA_VERSION};
use tracing::info;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade ledger as CSV.
///
/// Columns: order_id, date, security, side, amount, price, value,
/// commission, net_value
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "order_id",
        "date",
        "security",
        "side",
        "amount",
        "price",
        "value",
        "commission",
        "net_value",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.order_id.0.to_string(),
            &t.date.to_string(),
            &t.security,
            &t.side.to_string(),
            &format!("{:.0}", t.amount),
            &format!("{:.4}", t.price),
            &format!("{:.2}", t.value),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_value),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the recorded value curve as CSV: date, total_value, cash, return.
pub fn export_equity_csv(result: &BacktestResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total_value", "cash", "return"])?;
    for (snap, point) in result.portfolio_history.iter().zip(&result.returns) {
        wtr.write_record([
            &snap.timestamp.to_string(),
            &format!("{:.2}", snap.total_value),
            &format!("{:.2}", snap.cash),
            &format!("{:.6}", point.daily_return),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{strategy}_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trades.csv`: trade ledger
/// - `equity.csv`: per-date value curve
/// - `report.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    write(&run_dir.join("manifest.json"), &json)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trade_history)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(result)?)?;
    write(&run_dir.join("report.md"), &generate_report(result))?;

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    md.push_str(&format!("| Securities | {} |\n", result.securities.join(", ")));
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!("| Frequency | {} |\n", result.frequency));
    if let Some(benchmark) = &result.benchmark {
        md.push_str(&format!("| Benchmark | {benchmark} |\n"));
    }
    md.push_str(&format!("| Initial Cash | {:.2} |\n", result.initial_cash));
    md.push_str(&format!(
        "| Commission Rate | {} |\n",
        result.commission_rate
    ));
    md.push_str(&format!("| Slippage | {} |\n", result.slippage));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Final Value | {:.2} |\n",
        result.summary.total_value
    ));
    md.push_str(&format!("| Cash | {:.2} |\n", result.summary.cash));
    md.push_str(&format!(
        "| Total Return | {:.2}% |\n",
        m.total_return * 100.0
    ));
    md.push_str(&format!(
        "| Annual Return | {:.2}% |\n",
        m.annual_return * 100.0
    ));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!(
        "| Max Drawdown | {:.2}% |\n",
        m.max_drawdown * 100.0
    ));
    md.push_str(&format!("| Trades | {} |\n", m.total_trades));
    md.push_str(&format!("| Rejected Orders | {} |\n", result.rejected_orders));
    md.push('\n');

    if !result.final_positions.is_empty() {
        md.push_str("## Final Positions\n\n");
        md.push_str("| Security | Amount | Cost Basis | Last Price | Unrealized PnL |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: |\n");
        for p in &result.final_positions {
            md.push_str(&format!(
                "| {} | {:.0} | {:.4} | {:.4} | {:.2} |\n",
                p.security,
                p.amount,
                p.cost_basis,
                p.last_price,
                p.unrealized_pnl()
            ));
        }
        md.push('\n');
    }

    let problems: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.status != DayStatus::Processed)
        .collect();
    if !problems.is_empty() {
        md.push_str("## Diagnostics\n\n");
        md.push_str(&format!(
            "{} processed, {} skipped, {} failed.\n\n",
            result.processed_dates(),
            result.skipped_dates(),
            result.failed_dates()
        ));
        for d in problems {
            match &d.status {
                DayStatus::Skipped(reason) => {
                    md.push_str(&format!("- {}: skipped ({reason:?})\n", d.timestamp));
                }
                DayStatus::Failed(msg) => {
                    md.push_str(&format!("- {}: failed: {msg}\n", d.timestamp));
                }
                DayStatus::Processed => {}
            }
        }
        md.push('\n');
    }

    md
}

/// Plain-text summary for terminal output.
pub fn summary_table(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let rows = [
        ("Strategy", result.strategy.clone()),
        ("Period", format!("{} to {}", result.start, result.end)),
        ("Initial cash", format!("{:.2}", result.initial_cash)),
        ("Final value", format!("{:.2}", result.summary.total_value)),
        ("Total return", format!("{:.2}%", m.total_return * 100.0)),
        ("Annual return", format!("{:.2}%", m.annual_return * 100.0)),
        ("Sharpe", format!("{:.3}", m.sharpe_ratio)),
        ("Max drawdown", format!("{:.2}%", m.max_drawdown * 100.0)),
        ("Trades", m.total_trades.to_string()),
        ("Rejected orders", result.rejected_orders.to_string()),
        (
            "Dates",
            format!(
                "{} processed / {} skipped / {} failed",
                result.processed_dates(),
                result.skipped_dates(),
                result.failed_dates()
            ),
        ),
    ];
    let mut out = String::new();
    for (label, value) in rows {
        out.push_str(&format!("{label:<16} {value}\n"));
    }
    out
}
