//! Bull-probability ranking of buy candidates.
//!
//! A 0–100 display score; it orders candidates and never gates them.

use serde::Serialize;

use super::SignalEvent;
use crate::indicators::IndicatorFrame;

/// A buy event with its display ranking score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSignal {
    pub event: SignalEvent,
    pub bull_probability: f64,
}

// Ranking heuristic, not a fitted model. Each part scales to its weight and
// the weights sum to 100.
const CHANGE_WEIGHT: f64 = 25.0;
const VOLUME_WEIGHT: f64 = 25.0;
const DEPTH_WEIGHT: f64 = 15.0;
const RSI_WEIGHT: f64 = 20.0;
const HISTOGRAM_WEIGHT: f64 = 15.0;

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Bull probability for row `i`.
///
/// Sums the day's change, capped RVOL, depth below SMA50, RSI distance from 50
/// and MACD histogram improvement, each scaled to 0..=1 and weighted.
pub fn bull_probability(frame: &IndicatorFrame, i: usize) -> f64 {
    let Some(row) = frame.row(i) else {
        return 0.0;
    };
    let prev_close = if i > 0 { frame.close[i - 1] } else { f64::NAN };
    let prev_hist = if i > 0 { frame.macd_hist[i - 1] } else { f64::NAN };

    let pct_change = finite_or_zero((row.close - prev_close) / prev_close * 100.0);
    let change_part = CHANGE_WEIGHT * (pct_change / 5.0).clamp(0.0, 1.0);

    let volume_part = VOLUME_WEIGHT * finite_or_zero(row.rvol).clamp(0.0, 3.0) / 3.0;

    let depth = finite_or_zero((row.sma50 - row.close) / row.sma50 * 100.0);
    let depth_part = DEPTH_WEIGHT * (depth / 20.0).clamp(0.0, 1.0);

    let rsi_part = RSI_WEIGHT * (1.0 - (row.rsi - 50.0).abs() / 50.0).clamp(0.0, 1.0);

    let hist_delta = finite_or_zero((row.macd_hist - prev_hist) / row.close * 1000.0);
    let hist_part = HISTOGRAM_WEIGHT * hist_delta.clamp(0.0, 1.0);

    change_part + volume_part + depth_part + rsi_part + hist_part
}

/// Attach bull probabilities to buy events and sort best-first.
///
/// Sell events are dropped. Ties keep their input order.
pub fn rank_buy_candidates<'a>(
    candidates: impl IntoIterator<Item = (&'a IndicatorFrame, SignalEvent)>,
) -> Vec<RankedSignal> {
    let mut ranked: Vec<RankedSignal> = candidates
        .into_iter()
        .filter(|(_, event)| event.signal_type.is_buy())
        .map(|(frame, event)| RankedSignal {
            bull_probability: bull_probability(frame, event.bar_index),
            event,
        })
        .collect();
    ranked.sort_by(|a, b| b.bull_probability.total_cmp(&a.bull_probability));
    ranked
}
