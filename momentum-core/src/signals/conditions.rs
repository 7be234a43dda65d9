//! Per-day trigger conditions.
//!
//! Each function reads only rows `..=i` of the frame. Not-ready (NaN) inputs make
//! every comparison false, so insufficient history never fires a trigger.

use serde::{Deserialize, Serialize};

use super::SignalType;
use crate::indicators::IndicatorFrame;

/// Breakout: price must be within this fraction of the 50-day high.
const NEAR_HIGH_FRACTION: f64 = 0.98;
const BREAKOUT_MIN_RVOL: f64 = 1.1;
const BREAKOUT_MAX_RSI: f64 = 80.0;
const REVERSAL_MAX_RSI: f64 = 55.0;
const PANIC_CANDLE_GAIN: f64 = 1.03;
const REENTRY_MIN_ADX: f64 = 15.0;
const CLIMAX_RSI: f64 = 90.0;
const HOT_RSI: f64 = 70.0;
const COOLED_RSI: f64 = 60.0;
/// Sessions (including today) searched for a prior RSI above `HOT_RSI`.
const HOT_LOOKBACK: usize = 10;

/// Which reversal path fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalKind {
    GoldenCross { today: bool },
    EarlyTurn,
    PanicCandle,
}

/// Which profit-take path fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitKind {
    RsiClimax,
    MacdDeadCross,
    MacdDelayed,
}

/// A condition that held on a day, before cooldown/position gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub kind: SignalType,
    pub reason: String,
}

/// Every trigger condition for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DayConditions {
    pub breakout: bool,
    pub reversal: Option<ReversalKind>,
    pub reentry: bool,
    pub stop: bool,
    pub profit: Option<ProfitKind>,
}

impl DayConditions {
    /// Evaluate all conditions at row `i`. Rows past the end yield no conditions.
    pub fn evaluate(frame: &IndicatorFrame, i: usize) -> Self {
        if i >= frame.len() {
            return Self::default();
        }
        Self {
            breakout: breakout(frame, i),
            reversal: reversal(frame, i),
            reentry: reentry(frame, i),
            stop: chandelier_stop(frame, i),
            profit: profit_take(frame, i),
        }
    }

    /// Sell candidate; the stop has priority over profit-taking.
    pub fn sell_trigger(&self) -> Option<Trigger> {
        if self.stop {
            return Some(Trigger {
                kind: SignalType::SellStop,
                reason: "close fell through the chandelier exit".into(),
            });
        }
        self.profit.map(|kind| Trigger {
            kind: SignalType::SellProfit,
            reason: match kind {
                ProfitKind::RsiClimax => "RSI climax above 90",
                ProfitKind::MacdDeadCross => "MACD dead cross after RSI above 70",
                ProfitKind::MacdDelayed => "MACD bearish and RSI cooled below 60",
            }
            .into(),
        })
    }

    /// Buy candidate in priority order: breakout, reversal, re-entry.
    pub fn buy_trigger(&self) -> Option<Trigger> {
        if self.breakout {
            return Some(Trigger {
                kind: SignalType::Breakout,
                reason: "breakout on volume near the 50-day high".into(),
            });
        }
        if let Some(kind) = self.reversal {
            return Some(Trigger {
                kind: SignalType::Reversal,
                reason: match kind {
                    ReversalKind::GoldenCross { today: true } => "MACD golden cross today below SMA50",
                    ReversalKind::GoldenCross { today: false } => {
                        "MACD golden cross yesterday below SMA50"
                    }
                    ReversalKind::EarlyTurn => "MACD histogram turning up below zero",
                    ReversalKind::PanicCandle => "panic reversal candle on volume",
                }
                .into(),
            });
        }
        if self.reentry {
            return Some(Trigger {
                kind: SignalType::Reentry,
                reason: "pullback entry within an established uptrend".into(),
            });
        }
        None
    }

    pub fn has_buy(&self) -> bool {
        self.breakout || self.reversal.is_some() || self.reentry
    }

    pub fn has_sell(&self) -> bool {
        self.stop || self.profit.is_some()
    }
}

/// Value `back` rows before `i`, NaN when that row does not exist.
fn at(series: &[f64], i: usize, back: usize) -> f64 {
    i.checked_sub(back)
        .and_then(|j| series.get(j).copied())
        .unwrap_or(f64::NAN)
}

/// MACD crossed above its signal on row `i - back`.
fn golden_cross(frame: &IndicatorFrame, i: usize, back: usize) -> bool {
    at(&frame.macd, i, back) > at(&frame.macd_signal, i, back)
        && at(&frame.macd, i, back + 1) <= at(&frame.macd_signal, i, back + 1)
}

fn histogram_improving(frame: &IndicatorFrame, i: usize) -> bool {
    let h = &frame.macd_hist;
    at(h, i, 0) > at(h, i, 1) && at(h, i, 1) > at(h, i, 2)
}

fn breakout(frame: &IndicatorFrame, i: usize) -> bool {
    let close = frame.close[i];
    let trend = close > frame.sma50[i] || close > frame.sma20[i];
    let extension = close > frame.bb_upper[i] || close >= frame.high50[i] * NEAR_HIGH_FRACTION;
    let momentum = frame.macd[i] > frame.macd_signal[i] || frame.macd[i] > 0.0;
    trend
        && extension
        && frame.rvol[i] > BREAKOUT_MIN_RVOL
        && momentum
        && frame.rsi[i] < BREAKOUT_MAX_RSI
}

fn reversal(frame: &IndicatorFrame, i: usize) -> Option<ReversalKind> {
    let close = frame.close[i];
    let below_trend = close < frame.sma50[i];
    if !below_trend {
        return None;
    }
    let rsi = frame.rsi[i];
    let rvol = frame.rvol[i];

    if rsi < REVERSAL_MAX_RSI {
        if golden_cross(frame, i, 0) {
            return Some(ReversalKind::GoldenCross { today: true });
        }
        if golden_cross(frame, i, 1) {
            return Some(ReversalKind::GoldenCross { today: false });
        }
        if histogram_improving(frame, i) && frame.macd_hist[i] < 0.0 && rvol > 1.0 {
            return Some(ReversalKind::EarlyTurn);
        }
    }
    if close > frame.open[i] * PANIC_CANDLE_GAIN && rvol > 1.2 {
        return Some(ReversalKind::PanicCandle);
    }
    None
}

fn reentry(frame: &IndicatorFrame, i: usize) -> bool {
    let rsi = frame.rsi[i];
    let fresh_turn =
        golden_cross(frame, i, 0) || golden_cross(frame, i, 1) || histogram_improving(frame, i);
    frame.adx[i] > REENTRY_MIN_ADX
        && frame.close[i] > frame.sma50[i]
        && rsi > 40.0
        && rsi < 60.0
        && fresh_turn
}

fn chandelier_stop(frame: &IndicatorFrame, i: usize) -> bool {
    frame.close[i] < frame.chandelier[i]
        && at(&frame.close, i, 1) >= at(&frame.chandelier, i, 1)
}

fn profit_take(frame: &IndicatorFrame, i: usize) -> Option<ProfitKind> {
    let rsi = frame.rsi[i];
    let prev_rsi = at(&frame.rsi, i, 1);
    if rsi > CLIMAX_RSI && prev_rsi <= CLIMAX_RSI {
        return Some(ProfitKind::RsiClimax);
    }

    let start = (i + 1).saturating_sub(HOT_LOOKBACK);
    let was_hot = frame.rsi[start..=i].iter().any(|&r| r > HOT_RSI);
    let cooled = rsi < COOLED_RSI;
    if !was_hot || !cooled {
        return None;
    }

    let bearish = frame.macd[i] < frame.macd_signal[i];
    if bearish && at(&frame.macd, i, 1) >= at(&frame.macd_signal, i, 1) {
        return Some(ProfitKind::MacdDeadCross);
    }
    if bearish && prev_rsi >= COOLED_RSI {
        return Some(ProfitKind::MacdDelayed);
    }
    None
}
