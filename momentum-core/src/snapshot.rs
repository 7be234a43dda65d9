//! Strongly-typed per-instrument snapshot consumed by crash risk and scoring.
//!
//! Built from the indicator frame at a given row plus optional fundamentals.
//! Missing fundamentals resolve to documented neutral defaults at read time.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::indicators::sma::rolling_mean;
use crate::indicators::IndicatorFrame;

/// Sessions in one trading year.
pub const YEAR_SESSIONS: usize = 252;
/// Sessions searched for a fresh SMA50/SMA200 cross.
const CROSS_WINDOW: usize = 5;
/// Squeeze: width below this fraction of its 20-day average.
const SQUEEZE_FRACTION: f64 = 0.8;
const SQUEEZE_AVERAGE: usize = 20;

pub const DEFAULT_BETA: f64 = 1.0;
pub const DEFAULT_SHORT_RATIO: f64 = 0.0;
pub const DEFAULT_INSTITUTIONAL_OWNERSHIP: f64 = 0.0;
/// RS rating when no universe ranking is available.
pub const DEFAULT_RS_RATING: f64 = 50.0;

/// Upstream fundamentals; any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub beta: Option<f64>,
    pub short_ratio: Option<f64>,
    /// Fraction of shares held by institutions (0.0–1.0).
    pub institutional_ownership: Option<f64>,
}

impl Fundamentals {
    pub fn beta(&self) -> f64 {
        self.beta.unwrap_or(DEFAULT_BETA)
    }

    pub fn short_ratio(&self) -> f64 {
        self.short_ratio.unwrap_or(DEFAULT_SHORT_RATIO)
    }

    /// Institutional ownership as a percentage.
    pub fn institutional_pct(&self) -> f64 {
        self.institutional_ownership
            .unwrap_or(DEFAULT_INSTITUTIONAL_OWNERSHIP)
            * 100.0
    }
}

/// Display tags derived from the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    VolumeSpike,
    BullTrend,
    DipBuy,
    BearTrend,
    Overbought,
    Oversold,
    GoldenCross,
    DeathCross,
    Squeeze,
    NearHigh,
}

/// Returns are percentages; windows count sessions including today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub ret_1d: f64,
    pub ret_5d: f64,
    pub ret_1mo: f64,
    pub ret_3mo: f64,
    pub ret_6mo: f64,
    pub ret_ytd: f64,
    pub ret_1y: f64,
    pub rvol: f64,
    pub rsi: f64,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub above_sma50: bool,
    /// (price - SMA50) / SMA50 in percent; 0 when SMA50 is not ready.
    pub sma50_deviation: f64,
    pub high52: f64,
    pub low52: f64,
    /// Largest peak-to-trough decline over the last year, as a positive percentage.
    pub max_drawdown: f64,
    pub bb_width: f64,
    pub is_squeeze: bool,
    pub squeeze_days: u32,
    pub golden_cross: bool,
    pub death_cross: bool,
    pub fundamentals: Fundamentals,
    pub has_news: bool,
    /// Percentile of 1-year return within the scored universe (0–99).
    pub rs_rating: Option<f64>,
    pub tags: Vec<Tag>,
}

impl InstrumentSnapshot {
    /// Snapshot at the last row. `None` for an empty frame.
    pub fn from_frame(symbol: &str, frame: &IndicatorFrame, fundamentals: Fundamentals) -> Option<Self> {
        let last = frame.len().checked_sub(1)?;
        Self::at(symbol, frame, last, fundamentals)
    }

    /// Snapshot as of row `end`, reading nothing after it.
    pub fn at(
        symbol: &str,
        frame: &IndicatorFrame,
        end: usize,
        fundamentals: Fundamentals,
    ) -> Option<Self> {
        let row = frame.row(end)?;
        let closes = &frame.close[..=end];
        let year = &closes[closes.len().saturating_sub(YEAR_SESSIONS)..];
        let price = row.close;

        let ret_1y = if closes.len() >= YEAR_SESSIONS {
            trailing_return(closes, YEAR_SESSIONS)
        } else {
            pct_change(closes[0], price)
        };

        let sma50 = row.sma50.is_finite().then_some(row.sma50);
        let sma200 = row.sma200.is_finite().then_some(row.sma200);
        let sma50_deviation = match sma50 {
            Some(avg) if avg > 0.0 => (price - avg) / avg * 100.0,
            _ => 0.0,
        };

        let (is_squeeze, squeeze_days) = squeeze(&frame.bb_width[..=end]);
        let (golden_cross, death_cross) =
            fresh_crosses(&frame.sma50[..=end], &frame.sma200[..=end]);

        let mut snapshot = Self {
            symbol: symbol.to_string(),
            date: row.date,
            price,
            ret_1d: trailing_return(closes, 2),
            ret_5d: trailing_return(closes, 5),
            ret_1mo: trailing_return(closes, 21),
            ret_3mo: trailing_return(closes, 63),
            ret_6mo: trailing_return(closes, 126),
            ret_ytd: ytd_return(frame, end),
            ret_1y,
            rvol: row.rvol,
            rsi: row.rsi,
            sma50,
            sma200,
            above_sma50: price > row.sma50,
            sma50_deviation,
            high52: year.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            low52: year.iter().copied().fold(f64::INFINITY, f64::min),
            max_drawdown: max_drawdown(year),
            bb_width: if row.bb_width.is_finite() {
                row.bb_width
            } else {
                1.0
            },
            is_squeeze,
            squeeze_days,
            golden_cross,
            death_cross,
            fundamentals,
            has_news: false,
            rs_rating: None,
            tags: Vec::new(),
        };
        snapshot.tags = snapshot.derive_tags();
        Some(snapshot)
    }

    pub fn with_news(mut self, has_news: bool) -> Self {
        self.has_news = has_news;
        self
    }

    pub fn rs_rating_or_default(&self) -> f64 {
        self.rs_rating.unwrap_or(DEFAULT_RS_RATING)
    }

    /// Percent below the 52-week high (0 when at the high or undefined).
    pub fn pct_below_high(&self) -> f64 {
        if self.high52 > 0.0 && self.price > 0.0 {
            (self.high52 - self.price) / self.high52 * 100.0
        } else {
            0.0
        }
    }

    fn derive_tags(&self) -> Vec<Tag> {
        let mut tags = Vec::new();
        if self.rvol > 2.0 {
            tags.push(Tag::VolumeSpike);
        }
        if self.above_sma50 && self.ret_3mo > 0.0 {
            tags.push(Tag::BullTrend);
        }
        if self.above_sma50 && self.rsi < 45.0 {
            tags.push(Tag::DipBuy);
        }
        if !self.above_sma50 && self.ret_3mo < 0.0 {
            tags.push(Tag::BearTrend);
        }
        if self.rsi > 70.0 {
            tags.push(Tag::Overbought);
        }
        if self.rsi < 30.0 {
            tags.push(Tag::Oversold);
        }
        if self.golden_cross {
            tags.push(Tag::GoldenCross);
        }
        if self.death_cross {
            tags.push(Tag::DeathCross);
        }
        if self.is_squeeze {
            tags.push(Tag::Squeeze);
        }
        if self.price >= self.high52 * 0.98 {
            tags.push(Tag::NearHigh);
        }
        tags
    }
}

fn pct_change(base: f64, price: f64) -> f64 {
    if base > 0.0 {
        (price - base) / base * 100.0
    } else {
        0.0
    }
}

/// Return over a window of `sessions` closes ending today; 0 when history is shorter.
pub fn trailing_return(closes: &[f64], sessions: usize) -> f64 {
    if sessions == 0 || closes.len() < sessions {
        return 0.0;
    }
    let price = closes[closes.len() - 1];
    pct_change(closes[closes.len() - sessions], price)
}

/// Year-to-date return: against the last close of the prior year, or the first
/// open of this year for instruments listed this year.
fn ytd_return(frame: &IndicatorFrame, end: usize) -> f64 {
    let year = frame.dates[end].year();
    let price = frame.close[end];
    let dates = &frame.dates[..=end];
    match dates.iter().rposition(|d| d.year() < year) {
        Some(j) => pct_change(frame.close[j], price),
        None => pct_change(frame.open[0], price),
    }
}

/// Largest peak-to-trough decline as a positive percentage.
pub fn max_drawdown(closes: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &c in closes {
        peak = peak.max(c);
        if peak > 0.0 {
            worst = worst.max((peak - c) / peak);
        }
    }
    worst * 100.0
}

/// Squeeze flag and duration for the last row of `widths`.
fn squeeze(widths: &[f64]) -> (bool, u32) {
    let Some(&width) = widths.last() else {
        return (false, 0);
    };
    let average = rolling_mean(widths, SQUEEZE_AVERAGE);
    let threshold = match average.last() {
        Some(a) if a.is_finite() => a * SQUEEZE_FRACTION,
        _ => 0.0,
    };
    if !(width < threshold) {
        return (false, 0);
    }

    let earlier = widths.len().saturating_sub(SQUEEZE_AVERAGE)..widths.len() - 1;
    let run = widths[earlier]
        .iter()
        .rev()
        .take_while(|&&w| w < threshold)
        .count();
    (true, 1 + run as u32)
}

/// Fresh SMA50/SMA200 golden and death crosses within the last few sessions.
fn fresh_crosses(sma50: &[f64], sma200: &[f64]) -> (bool, bool) {
    let n = sma50.len();
    let mut golden = false;
    let mut death = false;
    for back in 1..=CROSS_WINDOW {
        if n < back + 1 {
            break;
        }
        let (prev, cur) = (n - back - 1, n - back);
        let ready = [sma50[prev], sma200[prev], sma50[cur], sma200[cur]]
            .iter()
            .all(|v| v.is_finite());
        if !ready {
            continue;
        }
        let was_above = sma50[prev] > sma200[prev];
        let is_above = sma50[cur] > sma200[cur];
        golden |= !was_above && is_above;
        death |= was_above && !is_above;
    }
    (golden, death)
}
