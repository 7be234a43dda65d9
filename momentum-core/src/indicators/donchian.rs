//! Rolling channel: highest high / lowest low over a lookback window.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - Upper: max(high[t-period+1..=t])
//! - Lower: min(low[t-period+1..=t])
//!
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

/// Which side of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct RollingChannel {
    period: usize,
    band: ChannelBand,
    name: String,
}

impl RollingChannel {
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            band: ChannelBand::Upper,
            name: format!("high_{period}"),
        }
    }

    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "channel period must be >= 1");
        Self {
            period,
            band: ChannelBand::Lower,
            name: format!("low_{period}"),
        }
    }
}

impl Indicator for RollingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let values: Vec<f64> = match self.band {
            ChannelBand::Upper => bars.iter().map(|b| b.high).collect(),
            ChannelBand::Lower => bars.iter().map(|b| b.low).collect(),
        };
        match self.band {
            ChannelBand::Upper => rolling_max(&values, self.period),
            ChannelBand::Lower => rolling_min(&values, self.period),
        }
    }
}

/// Rolling maximum over the trailing `period` values; NaN before the window fills.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme(values, period, f64::max)
}

/// Rolling minimum over the trailing `period` values; NaN before the window fills.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling_extreme(values, period, f64::min)
}

fn rolling_extreme(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().copied().fold(window[0], pick);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn channel_tracks_high_and_low() {
        let bars = make_ohlc_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.5, 8.0, 9.0),
            (9.0, 10.0, 8.5, 9.5),
        ]);
        let upper = RollingChannel::upper(3).compute(&bars);
        let lower = RollingChannel::lower(3).compute(&bars);

        assert!(upper[1].is_nan());
        assert_approx(upper[2], 15.0, DEFAULT_EPSILON);
        assert_approx(upper[3], 15.0, DEFAULT_EPSILON);
        assert_approx(lower[2], 8.0, DEFAULT_EPSILON);
        assert_approx(lower[3], 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_max_drops_old_values() {
        let result = rolling_max(&[5.0, 1.0, 1.0, 1.0], 2);
        assert_approx(result[1], 5.0, DEFAULT_EPSILON);
        assert_approx(result[2], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn channel_names() {
        assert_eq!(RollingChannel::upper(50).name(), "high_50");
        assert_eq!(RollingChannel::lower(50).name(), "low_50");
    }
}
