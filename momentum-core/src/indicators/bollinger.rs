//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three series (separate Indicator instances):
//! - Upper: SMA(close, period) + mult * stddev(close, period)
//! - Lower: SMA(close, period) - mult * stddev(close, period)
//! - Width: (upper - lower) / SMA; 1.0 when the SMA is ~0 (never "squeezed")
//!
//! Uses sample stddev (divide by N - 1).
//! Lookback: period - 1.

use super::sma::{rolling_mean, rolling_std};
use super::{closes, Indicator};
use crate::domain::Bar;

/// Width reported when the middle band is degenerate.
pub const DEGENERATE_WIDTH: f64 = 1.0;

/// Which Bollinger series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Lower,
    Width,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(band: BollingerBand, period: usize, multiplier: f64) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Lower => "lower",
            BollingerBand::Width => "width",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Upper, period, multiplier)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Lower, period, multiplier)
    }

    pub fn width(period: usize, multiplier: f64) -> Self {
        Self::new(BollingerBand::Width, period, multiplier)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes = closes(bars);
        let middle = rolling_mean(&closes, self.period);
        let stddev = rolling_std(&closes, self.period);

        middle
            .iter()
            .zip(&stddev)
            .map(|(&mid, &sd)| match self.band {
                BollingerBand::Upper => mid + self.multiplier * sd,
                BollingerBand::Lower => mid - self.multiplier * sd,
                BollingerBand::Width => {
                    if mid.is_nan() || sd.is_nan() {
                        f64::NAN
                    } else if mid.abs() < 1e-12 {
                        DEGENERATE_WIDTH
                    } else {
                        2.0 * self.multiplier * sd / mid
                    }
                }
            })
            .collect()
    }
}
