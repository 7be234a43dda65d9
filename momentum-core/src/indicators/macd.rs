//! MACD: moving average convergence/divergence.
//!
//! - Line: EMA(fast) - EMA(slow) of close
//! - Signal: EMA(signal) of the line, starting at the line's first valid value
//! - Histogram: line - signal
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal/histogram.

use super::ema::ema_of_series;
use super::{closes, Indicator};
use crate::domain::Bar;

/// Which MACD series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdSeries {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    series: MacdSeries,
    name: String,
}

impl Macd {
    pub fn new(series: MacdSeries, fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        let label = match series {
            MacdSeries::Line => "line",
            MacdSeries::Signal => "signal",
            MacdSeries::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            series,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    /// The conventional 12/26/9 configuration.
    pub fn standard(series: MacdSeries) -> Self {
        Self::new(series, 12, 26, 9)
    }
}

/// Line, signal and histogram computed together.
pub fn macd_components(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema_of_series(&line, signal);
    let histogram = line.iter().zip(&signal_line).map(|(l, s)| l - s).collect();
    (line, signal_line, histogram)
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.series {
            MacdSeries::Line => self.slow - 1,
            MacdSeries::Signal | MacdSeries::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (line, signal, histogram) =
            macd_components(&closes(bars), self.fast, self.slow, self.signal);
        match self.series {
            MacdSeries::Line => line,
            MacdSeries::Signal => signal,
            MacdSeries::Histogram => histogram,
        }
    }
}
