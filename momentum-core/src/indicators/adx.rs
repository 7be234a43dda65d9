//! ADX: Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period - 1 for ADX, period for the DI lines.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

/// Which directional series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdxSeries {
    Adx,
    PlusDi,
    MinusDi,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    series: AdxSeries,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self::with_series(AdxSeries::Adx, period)
    }

    pub fn with_series(series: AdxSeries, period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        let label = match series {
            AdxSeries::Adx => "adx",
            AdxSeries::PlusDi => "plus_di",
            AdxSeries::MinusDi => "minus_di",
        };
        Self {
            period,
            series,
            name: format!("{label}_{period}"),
        }
    }
}

/// ADX, +DI and -DI computed together.
pub fn directional_components(bars: &[Bar], period: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = bars.len();
    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        let high_diff = bars[i].high - bars[i - 1].high;
        let low_diff = bars[i - 1].low - bars[i].low;
        plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 {
            high_diff
        } else {
            0.0
        };
        minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 {
            low_diff
        } else {
            0.0
        };
    }

    // TR[0] has no previous close; keep the seed aligned with the DM series.
    let mut tr = true_range(bars);
    if let Some(first) = tr.first_mut() {
        *first = f64::NAN;
    }
    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus_dm = wilder_smooth(&plus_dm, period);
    let smooth_minus_dm = wilder_smooth(&minus_dm, period);

    let mut plus_di = vec![f64::NAN; n];
    let mut minus_di = vec![f64::NAN; n];
    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan()
            || smooth_plus_dm[i].is_nan()
            || smooth_minus_dm[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }

        plus_di[i] = 100.0 * smooth_plus_dm[i] / smooth_tr[i];
        minus_di[i] = 100.0 * smooth_minus_dm[i] / smooth_tr[i];
        let di_sum = plus_di[i] + minus_di[i];

        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum
        };
    }

    (wilder_smooth(&dx, period), plus_di, minus_di)
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.series {
            AdxSeries::Adx => 2 * self.period - 1,
            AdxSeries::PlusDi | AdxSeries::MinusDi => self.period,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (adx, plus_di, minus_di) = directional_components(bars, self.period);
        match self.series {
            AdxSeries::Adx => adx,
            AdxSeries::PlusDi => plus_di,
            AdxSeries::MinusDi => minus_di,
        }
    }
}
