//! Money Flow Index (MFI).
//!
//! Typical price = (H+L+C)/3, raw flow = typical price * volume.
//! Flow counts as positive when typical price rose vs. the prior bar and negative
//! when it fell. MFI = 100 - 100 / (1 + positive_sum / negative_sum) over `period` flows.
//! Warm-up rows and the no-flow case hold 50; zero negative flow → 100.

use super::Indicator;
use crate::domain::Bar;

/// Value reported while MFI is not computable.
pub const MFI_NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Mfi {
    period: usize,
    name: String,
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "MFI period must be >= 1");
        Self {
            period,
            name: format!("mfi_{period}"),
        }
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![MFI_NEUTRAL; n];

        if n < self.period + 1 {
            return result;
        }

        // (positive, negative) flow per bar; bar 0 has no direction.
        let flows: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                if i == 0 {
                    return (0.0, 0.0);
                }
                let tp = bars[i].typical_price();
                let prev_tp = bars[i - 1].typical_price();
                let raw = tp * bars[i].volume as f64;
                if tp > prev_tp {
                    (raw, 0.0)
                } else if tp < prev_tp {
                    (0.0, raw)
                } else {
                    (0.0, 0.0)
                }
            })
            .collect();

        for (i, slot) in result.iter_mut().enumerate().skip(self.period) {
            let window = &flows[(i + 1 - self.period)..=i];
            let positive: f64 = window.iter().map(|f| f.0).sum();
            let negative: f64 = window.iter().map(|f| f.1).sum();
            *slot = if positive == 0.0 && negative == 0.0 {
                MFI_NEUTRAL
            } else if negative == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + positive / negative)
            };
        }

        result
    }
}
