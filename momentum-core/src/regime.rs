//! Market regime: five ordered levels from a volatility-index reading and a
//! broad-index trend reading.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::indicators::IndicatorFrame;

/// Volatility placeholder used when the regime cannot be determined.
pub const FALLBACK_VOLATILITY: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLevel {
    ExtremeGreed,
    Greed,
    Neutral,
    Fear,
    ExtremeFear,
}

impl RegimeLevel {
    pub const ALL: [RegimeLevel; 5] = [
        Self::ExtremeGreed,
        Self::Greed,
        Self::Neutral,
        Self::Fear,
        Self::ExtremeFear,
    ];

    pub fn is_greed(self) -> bool {
        matches!(self, Self::ExtremeGreed | Self::Greed)
    }

    pub fn is_fear(self) -> bool {
        matches!(self, Self::Fear | Self::ExtremeFear)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtremeGreed => "extreme_greed",
            Self::Greed => "greed",
            Self::Neutral => "neutral",
            Self::Fear => "fear",
            Self::ExtremeFear => "extreme_fear",
        }
    }
}

impl std::fmt::Display for RegimeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad-index price against its 50- and 200-day averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReading {
    pub price: f64,
    pub sma50: f64,
    pub sma200: f64,
}

impl TrendReading {
    /// Latest trend reading, `None` while either average is not ready.
    pub fn from_frame(frame: &IndicatorFrame) -> Option<Self> {
        let row = frame.last()?;
        let reading = Self {
            price: row.close,
            sma50: row.sma50,
            sma200: row.sma200,
        };
        reading.is_ready().then_some(reading)
    }

    fn is_ready(&self) -> bool {
        self.price.is_finite() && self.sma50.is_finite() && self.sma200.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub level: RegimeLevel,
    pub volatility: f64,
    pub trend: Option<TrendReading>,
}

impl RegimeState {
    pub fn neutral_fallback() -> Self {
        Self {
            level: RegimeLevel::Neutral,
            volatility: FALLBACK_VOLATILITY,
            trend: None,
        }
    }
}

impl Default for RegimeState {
    fn default() -> Self {
        Self::neutral_fallback()
    }
}

/// Classify the market; first matching rule wins.
///
/// A missing volatility reading or trend reading falls back to neutral.
pub fn classify(volatility: Option<f64>, trend: Option<TrendReading>) -> RegimeState {
    let (Some(vix), Some(trend)) = (volatility.filter(|v| v.is_finite()), trend) else {
        warn!("regime inputs unavailable; defaulting to neutral");
        return RegimeState::neutral_fallback();
    };
    if !trend.is_ready() {
        warn!("regime trend reading not ready; defaulting to neutral");
        return RegimeState::neutral_fallback();
    }

    let level = if vix < 15.0 && trend.price > trend.sma50 {
        RegimeLevel::ExtremeGreed
    } else if vix < 20.0 && trend.price > trend.sma50 {
        RegimeLevel::Greed
    } else if vix > 30.0 || trend.price < trend.sma200 {
        RegimeLevel::ExtremeFear
    } else if vix > 25.0 || trend.price < trend.sma50 {
        RegimeLevel::Fear
    } else {
        RegimeLevel::Neutral
    };

    RegimeState {
        level,
        volatility: vix,
        trend: Some(trend),
    }
}
