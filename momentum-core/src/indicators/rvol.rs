//! Relative volume (RVOL).
//!
//! volume[t] / mean(volume[t-period..t]), the preceding `period` sessions
//! excluding today. 0 when history is too short or the average is 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct RelativeVolume {
    period: usize,
    name: String,
}

impl RelativeVolume {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RVOL period must be >= 1");
        Self {
            period,
            name: format!("rvol_{period}"),
        }
    }
}

impl Indicator for RelativeVolume {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![0.0; n];

        let mut window_sum: f64 = bars
            .iter()
            .take(self.period)
            .map(|b| b.volume as f64)
            .sum();
        for i in self.period..n {
            let avg = window_sum / self.period as f64;
            if avg > 0.0 {
                result[i] = bars[i].volume as f64 / avg;
            }
            window_sum += bars[i].volume as f64 - bars[i - self.period].volume as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn constant_volume_is_one() {
        let result = RelativeVolume::new(20).compute(&make_bars(&[10.0; 25]));
        assert_eq!(result[19], 0.0);
        assert_approx(result[20], 1.0, DEFAULT_EPSILON);
        assert_approx(result[24], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn excludes_current_day_from_average() {
        let mut bars = make_bars(&[10.0; 4]);
        bars[3].volume = 3000;
        let result = RelativeVolume::new(3).compute(&bars);
        assert_approx(result[3], 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_average_volume_is_zero() {
        let mut bars = make_bars(&[10.0; 4]);
        for bar in bars.iter_mut().take(3) {
            bar.volume = 0;
        }
        let result = RelativeVolume::new(3).compute(&bars);
        assert_eq!(result[3], 0.0);
    }
}
