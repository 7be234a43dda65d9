//! Chandelier Exit: trailing stop line hung from the recent high.
//!
//! line[t] = max(high[t-period+1..=t]) - multiplier * ATR(atr_period)[t].
//! The production setting is 22 / 14 / 5.0; the wide multiplier keeps
//! high-beta names from being shaken out on ordinary pullbacks.

use super::atr::Atr;
use super::donchian::rolling_max;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct ChandelierExit {
    period: usize,
    atr_period: usize,
    multiplier: f64,
    name: String,
}

impl ChandelierExit {
    pub fn new(period: usize, atr_period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "chandelier period must be >= 1");
        assert!(multiplier > 0.0, "chandelier multiplier must be positive");
        Self {
            period,
            atr_period,
            multiplier,
            name: format!("chandelier_{period}_{atr_period}_{multiplier}"),
        }
    }
}

impl Indicator for ChandelierExit {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.max(self.atr_period).saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let highest = rolling_max(&highs, self.period);
        let atr = Atr::new(self.atr_period).compute(bars);
        highest
            .iter()
            .zip(&atr)
            .map(|(h, a)| h - self.multiplier * a)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn line_hangs_below_highest_high() {
        // Constant 2-point range with no gaps: TR = 2, ATR = 2
        let bars = make_ohlc_bars(&[(10.0, 11.0, 9.0, 10.0); 5]);
        let line = ChandelierExit::new(3, 3, 2.0).compute(&bars);
        assert!(line[1].is_nan());
        assert_approx(line[2], 11.0 - 2.0 * 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookback_covers_both_windows() {
        assert_eq!(ChandelierExit::new(22, 14, 5.0).lookback(), 21);
    }
}
