//! Single-instrument analysis: full scan plus a current-status verdict.

use serde::{Deserialize, Serialize};

use super::scanner::scan_full;
use super::state::ScanRules;
use super::{SignalEvent, SignalType};
use crate::indicators::{FrameRow, IndicatorFrame};

/// Sessions searched for the most recent buy and sell dates.
const RECENT_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Buy,
    Sell,
    Hold,
    Wait,
}

/// Deep-dive result for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub status: AnalysisStatus,
    pub action: String,
    /// Quick 0–100 momentum score of the latest row.
    pub quick_score: u32,
    pub latest: FrameRow,
    pub last_buy: Option<chrono::NaiveDate>,
    pub last_sell: Option<chrono::NaiveDate>,
    pub events: Vec<SignalEvent>,
}

/// Quick momentum score: RVOL, trend vs SMA50/SMA150, RSI zone, narrow bands.
pub fn quick_score(row: &FrameRow) -> u32 {
    let mut score = 0;
    if row.rvol > 2.0 {
        score += 30;
    } else if row.rvol > 1.5 {
        score += 20;
    } else if row.rvol > 1.0 {
        score += 10;
    }
    if row.close > row.sma50 {
        score += 20;
    }
    if row.close > row.sma150 {
        score += 10;
    }
    if (50.0..=70.0).contains(&row.rsi) {
        score += 20;
    } else if row.rsi > 70.0 && row.rsi <= 85.0 {
        score += 10;
    }
    if row.bb_width < 0.15 {
        score += 10;
    }
    score
}

fn hold_action(row: &FrameRow) -> String {
    if row.rsi > 80.0 {
        format!(
            "strongest momentum (RSI {:.0}); let it run toward a climax above 90",
            row.rsi
        )
    } else if row.macd > row.macd_signal {
        format!(
            "uptrend intact; keep the stop at {:.2} (chandelier)",
            row.chandelier
        )
    } else {
        format!(
            "trend holding but cooling; respect the stop at {:.2}",
            row.chandelier
        )
    }
}

/// Full scan plus status for the last session. `None` for an empty frame.
pub fn analyze(symbol: &str, frame: &IndicatorFrame, rules: &ScanRules) -> Option<Analysis> {
    let latest = frame.last()?;
    let last = frame.len() - 1;
    let events = scan_full(symbol, frame, rules).events;

    let recent_start = frame.len().saturating_sub(RECENT_WINDOW);
    let recent = events.iter().filter(|e| e.bar_index >= recent_start);
    let last_buy = recent
        .clone()
        .filter(|e| e.signal_type.is_buy())
        .map(|e| e.date)
        .last();
    let last_sell = recent
        .filter(|e| e.signal_type.is_sell())
        .map(|e| e.date)
        .last();

    let today = events.last().filter(|e| e.bar_index == last);
    let (status, action) = match today.map(|e| e.signal_type) {
        Some(kind) if kind.is_buy() => (
            AnalysisStatus::Buy,
            "entry: strong energy release confirmed".to_string(),
        ),
        Some(SignalType::SellProfit) => (
            AnalysisStatus::Sell,
            "take profit: climax or MACD reversal".to_string(),
        ),
        Some(_) => (
            AnalysisStatus::Sell,
            "exit: key support line broken".to_string(),
        ),
        None if latest.close > latest.chandelier && latest.close > latest.sma50 => {
            (AnalysisStatus::Hold, hold_action(&latest))
        }
        None => (
            AnalysisStatus::Wait,
            "no clear trend; wait for the next setup".to_string(),
        ),
    };

    Some(Analysis {
        symbol: symbol.to_string(),
        status,
        action,
        quick_score: quick_score(&latest),
        latest,
        last_buy,
        last_sell,
        events,
    })
}
