//! Artifact export: JSON manifest, CSV tapes, and the journal.
//!
//! All persisted manifests include a `schema_version` field. Newer versions
//! than this build understands are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::runner::{BacktestResult, EquityPoint, SCHEMA_VERSION};
use crate::trades::{ExitReason, TradeRecord};

/// Characters of the run id used in the artifact directory name.
const RUN_ID_PREFIX: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
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

/// Columns: symbol, entry_date, entry_price, exit_date, exit_price, size,
/// gross_pnl, commission, net_pnl, return_pct, exit_reason
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "size",
        "gross_pnl",
        "commission",
        "net_pnl",
        "return_pct",
        "exit_reason",
    ])?;

    for t in trades {
        let reason = match t.exit_reason {
            ExitReason::Signal => "signal",
            ExitReason::TrailingStop => "trailing_stop",
        };
        wtr.write_record([
            t.symbol.clone(),
            t.entry_date.to_string(),
            format!("{:.6}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.6}", t.exit_price),
            t.size.to_string(),
            format!("{:.2}", t.gross_pnl),
            format!("{:.2}", t.commission),
            format!("{:.2}", t.net_pnl),
            format!("{:.4}", t.return_pct()),
            reason.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for point in equity_curve {
        wtr.write_record([point.date.to_string(), format!("{:.2}", point.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Directory name for a result: `{symbol}_{run id prefix}`.
pub fn artifact_dir_name(result: &BacktestResult) -> String {
    let prefix: String = result.run_id.chars().take(RUN_ID_PREFIX).collect();
    format!("{}_{}", result.symbol, prefix)
}

/// Save the full artifact set for a single backtest run.
///
/// Creates `{symbol}_{run id prefix}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trades.csv`: completed round trips
/// - `equity.csv`: bar-by-bar portfolio value
/// - `journal.log`: one line per decision, fill, and cancellation
///
/// Rerunning the same config overwrites the same directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    write_file(&run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    write_file(&run_dir.join("trades.csv"), &trades_csv)?;

    let equity_csv = export_equity_csv(&result.equity_curve)?;
    write_file(&run_dir.join("equity.csv"), &equity_csv)?;

    let mut journal = result.journal.join("\n");
    if !journal.is_empty() {
        journal.push('\n');
    }
    write_file(&run_dir.join("journal.log"), &journal)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_manifest(run_dir: &Path) -> Result<BacktestResult> {
    let path = run_dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
