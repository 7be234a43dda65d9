//! IndicatorFrame: every derived series for one instrument, one row per bar.
//!
//! Built once from the full bar history and never mutated; rebuilding from the
//! same bars yields identical values. Rows before a window's minimum period hold
//! NaN (RSI/MFI hold 50, RVOL holds 0) and every comparison against NaN is false,
//! so conditions over not-ready rows simply do not fire.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::adx::directional_components;
use super::macd::macd_components;
use super::{
    closes, Atr, Bollinger, ChandelierExit, Indicator, Mfi, RelativeVolume, RollingChannel, Rsi,
    Sma,
};
use crate::domain::{validate_series, Bar, BarError};

pub const RSI_PERIOD: usize = 14;
pub const RVOL_PERIOD: usize = 20;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const CHANNEL_PERIOD: usize = 50;
pub const ATR_PERIOD: usize = 14;
pub const CHANDELIER_PERIOD: usize = 22;
pub const CHANDELIER_MULTIPLIER: f64 = 5.0;
pub const ADX_PERIOD: usize = 14;
pub const MFI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Column-oriented indicator table aligned with the source bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub sma20: Vec<f64>,
    pub sma50: Vec<f64>,
    pub sma150: Vec<f64>,
    pub sma200: Vec<f64>,
    pub bb_upper: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub bb_width: Vec<f64>,
    pub rsi: Vec<f64>,
    pub rvol: Vec<f64>,
    pub high50: Vec<f64>,
    pub low50: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_hist: Vec<f64>,
    pub atr: Vec<f64>,
    pub chandelier: Vec<f64>,
    pub mfi: Vec<f64>,
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// One row of the frame, copied out for condition evaluation and event snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma150: f64,
    pub sma200: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub rsi: f64,
    pub rvol: f64,
    pub high50: f64,
    pub low50: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub atr: f64,
    pub chandelier: f64,
    pub mfi: f64,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

impl IndicatorFrame {
    /// Validate the bars and derive every indicator series.
    pub fn build(bars: &[Bar]) -> Result<Self, BarError> {
        validate_series(bars)?;
        let frame = Self::compute(bars);
        debug!(bars = bars.len(), "indicator frame built");
        Ok(frame)
    }

    fn compute(bars: &[Bar]) -> Self {
        let (macd, macd_signal, macd_hist) =
            macd_components(&closes(bars), MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let (adx, plus_di, minus_di) = directional_components(bars, ADX_PERIOD);
        Self {
            dates: bars.iter().map(|b| b.date).collect(),
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
            volume: bars.iter().map(|b| b.volume as f64).collect(),
            sma20: Sma::new(20).compute(bars),
            sma50: Sma::new(50).compute(bars),
            sma150: Sma::new(150).compute(bars),
            sma200: Sma::new(200).compute(bars),
            bb_upper: Bollinger::upper(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars),
            bb_lower: Bollinger::lower(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars),
            bb_width: Bollinger::width(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER).compute(bars),
            rsi: Rsi::new(RSI_PERIOD).compute(bars),
            rvol: RelativeVolume::new(RVOL_PERIOD).compute(bars),
            high50: RollingChannel::upper(CHANNEL_PERIOD).compute(bars),
            low50: RollingChannel::lower(CHANNEL_PERIOD).compute(bars),
            macd,
            macd_signal,
            macd_hist,
            atr: Atr::new(ATR_PERIOD).compute(bars),
            chandelier: ChandelierExit::new(CHANDELIER_PERIOD, ATR_PERIOD, CHANDELIER_MULTIPLIER)
                .compute(bars),
            mfi: Mfi::new(MFI_PERIOD).compute(bars),
            adx,
            plus_di,
            minus_di,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row `i`, or `None` past the end.
    pub fn row(&self, i: usize) -> Option<FrameRow> {
        if i >= self.len() {
            return None;
        }
        Some(FrameRow {
            date: self.dates[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
            sma20: self.sma20[i],
            sma50: self.sma50[i],
            sma150: self.sma150[i],
            sma200: self.sma200[i],
            bb_upper: self.bb_upper[i],
            bb_lower: self.bb_lower[i],
            bb_width: self.bb_width[i],
            rsi: self.rsi[i],
            rvol: self.rvol[i],
            high50: self.high50[i],
            low50: self.low50[i],
            macd: self.macd[i],
            macd_signal: self.macd_signal[i],
            macd_hist: self.macd_hist[i],
            atr: self.atr[i],
            chandelier: self.chandelier[i],
            mfi: self.mfi[i],
            adx: self.adx[i],
            plus_di: self.plus_di[i],
            minus_di: self.minus_di[i],
        })
    }

    /// The most recent row.
    pub fn last(&self) -> Option<FrameRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Series lookup by column name, for generic checks and tooling.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        let series = match name {
            "open" => &self.open,
            "high" => &self.high,
            "low" => &self.low,
            "close" => &self.close,
            "volume" => &self.volume,
            "sma20" => &self.sma20,
            "sma50" => &self.sma50,
            "sma150" => &self.sma150,
            "sma200" => &self.sma200,
            "bb_upper" => &self.bb_upper,
            "bb_lower" => &self.bb_lower,
            "bb_width" => &self.bb_width,
            "rsi" => &self.rsi,
            "rvol" => &self.rvol,
            "high50" => &self.high50,
            "low50" => &self.low50,
            "macd" => &self.macd,
            "macd_signal" => &self.macd_signal,
            "macd_hist" => &self.macd_hist,
            "atr" => &self.atr,
            "chandelier" => &self.chandelier,
            "mfi" => &self.mfi,
            "adx" => &self.adx,
            "plus_di" => &self.plus_di,
            "minus_di" => &self.minus_di,
            _ => return None,
        };
        Some(series.as_slice())
    }

    /// Names of every derived (non-price) column.
    pub const INDICATOR_COLUMNS: [&'static str; 20] = [
        "sma20",
        "sma50",
        "sma150",
        "sma200",
        "bb_upper",
        "bb_lower",
        "bb_width",
        "rsi",
        "rvol",
        "high50",
        "low50",
        "macd",
        "macd_signal",
        "macd_hist",
        "atr",
        "chandelier",
        "mfi",
        "adx",
        "plus_di",
        "minus_di",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.2).sin() * 8.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn every_column_matches_bar_count() {
        let bars = make_bars(&wave(230));
        let frame = IndicatorFrame::build(&bars).unwrap();
        assert_eq!(frame.len(), 230);
        for name in IndicatorFrame::INDICATOR_COLUMNS {
            assert_eq!(frame.series(name).unwrap().len(), 230, "{name}");
        }
    }

    #[test]
    fn long_windows_not_ready_early() {
        let bars = make_bars(&wave(230));
        let frame = IndicatorFrame::build(&bars).unwrap();
        assert!(frame.sma200[198].is_nan());
        assert!(!frame.sma200[199].is_nan());
        assert!(frame.high50[48].is_nan());
        assert!(!frame.chandelier[21].is_nan());
    }

    #[test]
    fn rebuild_is_identical() {
        let bars = make_bars(&wave(120));
        let a = IndicatorFrame::build(&bars).unwrap();
        let b = IndicatorFrame::build(&bars).unwrap();
        for name in IndicatorFrame::INDICATOR_COLUMNS {
            let (x, y) = (a.series(name).unwrap(), b.series(name).unwrap());
            for (i, (p, q)) in x.iter().zip(y).enumerate() {
                assert!(p.to_bits() == q.to_bits(), "{name} differs at {i}");
            }
        }
    }

    #[test]
    fn rejects_unordered_bars() {
        let mut bars = make_bars(&wave(10));
        bars.swap(3, 4);
        assert!(matches!(
            IndicatorFrame::build(&bars),
            Err(BarError::Unordered { index: 4, .. })
        ));
    }

    #[test]
    fn empty_frame_has_no_rows() {
        let frame = IndicatorFrame::build(&[]).unwrap();
        assert!(frame.is_empty());
        assert!(frame.last().is_none());
    }

    #[test]
    fn row_copies_columns() {
        let bars = make_bars(&wave(60));
        let frame = IndicatorFrame::build(&bars).unwrap();
        let row = frame.row(55).unwrap();
        assert_eq!(row.close, bars[55].close);
        assert_eq!(row.sma50.to_bits(), frame.sma50[55].to_bits());
        assert!(frame.row(60).is_none());
    }

    #[test]
    fn shared_columns_match_single_series_indicators() {
        use crate::indicators::{Adx, AdxSeries, Macd, MacdSeries};

        let bars = make_bars(&wave(120));
        let frame = IndicatorFrame::build(&bars).unwrap();
        let expected = [
            ("macd", Macd::standard(MacdSeries::Line).compute(&bars)),
            ("macd_signal", Macd::standard(MacdSeries::Signal).compute(&bars)),
            ("macd_hist", Macd::standard(MacdSeries::Histogram).compute(&bars)),
            ("adx", Adx::new(ADX_PERIOD).compute(&bars)),
            ("plus_di", Adx::with_series(AdxSeries::PlusDi, ADX_PERIOD).compute(&bars)),
            ("minus_di", Adx::with_series(AdxSeries::MinusDi, ADX_PERIOD).compute(&bars)),
        ];
        for (name, values) in expected {
            let column = frame.series(name).unwrap();
            for (i, (p, q)) in column.iter().zip(&values).enumerate() {
                assert!(p.to_bits() == q.to_bits(), "{name} differs at {i}");
            }
        }
    }

    #[test]
    fn unknown_series_name() {
        let frame = IndicatorFrame::build(&make_bars(&wave(5))).unwrap();
        assert!(frame.series("vwap").is_none());
    }
}
