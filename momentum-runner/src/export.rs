//! Report export: JSON for the full batch, CSV for picks and signals.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use momentum_core::scoring::{Horizon, HorizonPicks};
use momentum_core::signals::{RankedSignal, SignalEvent};

use crate::batch::BatchReport;

/// Serialize a `BatchReport` to pretty JSON. NaN values become `null`.
pub fn export_json(report: &BatchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BatchReport to JSON")
}

/// Picks for every horizon, one row per pick.
///
/// Columns: horizon, rank, symbol, sector, score, crash_risk, reason
pub fn export_picks_csv(picks: &HorizonPicks) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "horizon",
        "rank",
        "symbol",
        "sector",
        "score",
        "crash_risk",
        "reason",
    ])?;

    for horizon in Horizon::ALL {
        for (rank, pick) in picks.get(horizon).iter().enumerate() {
            wtr.write_record([
                horizon.as_str(),
                &(rank + 1).to_string(),
                &pick.symbol,
                pick.sector.as_deref().unwrap_or(""),
                &format!("{:.2}", pick.score),
                &pick.crash_risk.to_string(),
                &pick.reason,
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Last-session signals: ranked buys first, then sells.
///
/// Columns: symbol, date, type, reason, price, bull_probability
pub fn export_signals_csv(buys: &[RankedSignal], sells: &[SignalEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol", "date", "type", "reason", "price", "bull_probability"])?;

    let rows = buys
        .iter()
        .map(|r| (&r.event, Some(r.bull_probability)))
        .chain(sells.iter().map(|e| (e, None)));
    for (event, probability) in rows {
        wtr.write_record([
            &event.symbol,
            &event.date.to_string(),
            event.signal_type.as_str(),
            &event.reason,
            &format!("{:.4}", event.price),
            &probability.map(|p| format!("{p:.1}")).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `report.json`, `picks.csv` and `signals.csv` into `output_dir/<as_of>/`.
///
/// Returns the directory written.
pub fn save_report(report: &BatchReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = report
        .as_of
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "empty".to_string());
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create report dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("picks.csv"), export_picks_csv(&report.picks)?)?;
    std::fs::write(
        run_dir.join("signals.csv"),
        export_signals_csv(&report.buy_signals, &report.sell_signals)?,
    )?;

    Ok(run_dir)
}
