//! Bar: one trading session of OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single instrument on a single day.
///
/// Prices are assumed split/dividend adjusted by whatever fetched them.
/// A series is ordered ascending by date; holidays are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high bounds open/close, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Typical price (H+L+C)/3, used by money flow.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Reasons a bar series is rejected before indicators are derived.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    Unordered {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
    #[error("bar {index} ({date}) has a non-finite price")]
    NonFinite { index: usize, date: NaiveDate },
    #[error("bar {index} ({date}) has high {high} below low {low}")]
    InvertedRange {
        index: usize,
        date: NaiveDate,
        high: f64,
        low: f64,
    },
}

/// Check that a series is strictly ascending by date with finite, non-inverted prices.
///
/// Insufficient history is not an error: short series simply leave indicators not ready.
pub fn validate_series(bars: &[Bar]) -> Result<(), BarError> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.is_void() {
            return Err(BarError::NonFinite {
                index,
                date: bar.date,
            });
        }
        if bar.high < bar.low {
            return Err(BarError::InvertedRange {
                index,
                date: bar.date,
                high: bar.high,
                low: bar.low,
            });
        }
        if index > 0 && bar.date <= bars[index - 1].date {
            return Err(BarError::Unordered {
                index,
                date: bar.date,
                previous: bars[index - 1].date,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        assert!((sample_bar().typical_price() - 102.0).abs() < 1e-12);
    }

    #[test]
    fn validate_accepts_ascending_series() {
        let first = sample_bar();
        let mut second = sample_bar();
        second.date = first.date.succ_opt().unwrap();
        assert_eq!(validate_series(&[first, second]), Ok(()));
        assert_eq!(validate_series(&[]), Ok(()));
    }

    #[test]
    fn validate_rejects_duplicate_date() {
        let bars = vec![sample_bar(), sample_bar()];
        assert!(matches!(
            validate_series(&bars),
            Err(BarError::Unordered { index: 1, .. })
        ));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(matches!(
            validate_series(&[bar]),
            Err(BarError::InvertedRange { index: 0, .. })
        ));
    }

    #[test]
    fn validate_rejects_infinite_close() {
        let mut bar = sample_bar();
        bar.close = f64::INFINITY;
        assert!(matches!(
            validate_series(&[bar]),
            Err(BarError::NonFinite { .. })
        ));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
