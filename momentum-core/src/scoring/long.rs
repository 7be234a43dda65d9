//! Long horizon (6 months and more): trend stability and yearly alpha.

use super::regime::adjustment;
use super::{normalize, Breakdown, Horizon, ScoringContext};
use crate::snapshot::InstrumentSnapshot;

pub const COLLAPSED_CHART: &str = "collapsed chart";

/// Far below the 52-week high while the yearly return still looks good.
pub fn is_collapsed_chart(snap: &InstrumentSnapshot) -> bool {
    let below = snap.pct_below_high();
    (below > 60.0 && snap.ret_1y > 50.0) || (below > 50.0 && snap.ret_1y > 30.0)
}

pub(super) fn score(snap: &InstrumentSnapshot, risk: u32, ctx: &ScoringContext<'_>) -> Breakdown {
    let mut b = Breakdown::default();
    if is_collapsed_chart(snap) {
        b.add(COLLAPSED_CHART, 0.0);
        return b;
    }

    let (ret_1y, ret_6mo, ret_3mo) = (snap.ret_1y, snap.ret_6mo, snap.ret_3mo);
    let max_dd = snap.max_drawdown;

    if ret_1y > 300.0 {
        if max_dd < 30.0 {
            b.add("stable super-growth", 10.0);
        } else if max_dd > 60.0 {
            b.add("pump and dump risk", -25.0);
        }
    } else if ret_1y > 200.0 && max_dd > 50.0 {
        b.add("high volatility", -15.0);
    }

    if snap.pct_below_high() > 40.0 && ret_1y > 20.0 {
        b.add("deep correction", -15.0);
    }

    let stability = if ret_1y > ret_6mo && ret_6mo > ret_3mo && ret_3mo > 0.0 {
        100.0
    } else if ret_1y > 0.0 && ret_6mo > 0.0 && ret_3mo > 0.0 {
        80.0
    } else if ret_6mo > 0.0 && ret_3mo > 0.0 {
        60.0
    } else if ret_3mo > 0.0 {
        40.0
    } else {
        0.0
    };
    b.add("trend stability", 0.30 * stability);

    let label = format!("1y {ret_1y:.0}%");
    if ret_1y > 300.0 {
        b.add(label, 10.0);
    } else if ret_1y > 150.0 {
        b.add(label, 15.0);
    } else if ret_1y > 50.0 {
        b.add(label, 20.0);
    } else if ret_1y > 20.0 {
        b.add(label, 10.0);
    } else if ret_1y > 0.0 {
        b.add(label, 5.0);
    }

    if let Some(range) = ctx.stats.ret_ytd {
        b.add(
            format!("YTD {:.0}%", snap.ret_ytd),
            0.15 * range.normalize(snap.ret_ytd),
        );
    }

    if matches!(snap.sma200, Some(sma) if sma > 0.0 && snap.price > sma) {
        b.add("above SMA200", 10.0);
    }

    let beta = snap.fundamentals.beta();
    let beta_points = if (1.0..=2.5).contains(&beta) {
        10.0
    } else if (0.8..1.0).contains(&beta) {
        5.0
    } else if beta < 0.8 {
        2.0
    } else if beta <= 3.5 {
        6.0
    } else {
        3.0
    };
    b.add(format!("beta {beta:.2}"), beta_points);

    let short_ratio = snap.fundamentals.short_ratio();
    let short_points = if (2.0..=5.0).contains(&short_ratio) {
        4.0
    } else if short_ratio < 2.0 {
        3.0
    } else {
        2.0
    };
    b.add(format!("short ratio {short_ratio:.1}"), short_points);

    if let Some(etf) = ctx.sector_etf(&snap.symbol) {
        b.add(
            format!("sector YTD {:.1}%", etf.ret_ytd),
            0.05 * normalize(etf.ret_ytd, -20.0, 50.0),
        );
    }

    let rvol = snap.rvol;
    let rvol_points = if rvol > 1.5 {
        5.0
    } else if rvol > 1.0 {
        3.0
    } else {
        1.5
    };
    b.add(format!("RVOL {rvol:.1}x"), rvol_points);

    if rvol > 1.5 && snap.ret_ytd < 10.0 {
        b.add("distribution: volume up, YTD weak", -8.0);
    } else if rvol > 1.3 && snap.ret_ytd < 0.0 {
        b.add("distribution: volume up, YTD negative", -6.0);
    }

    if risk > 80 {
        b.add(format!("crash risk {risk}"), -0.05 * f64::from(risk));
    } else if risk < 15 {
        b.add("low crash risk", 5.0);
    }

    let inst = snap.fundamentals.institutional_pct();
    if inst > 70.0 {
        b.add(format!("institutions {inst:.0}%"), 2.0);
    } else if inst > 40.0 {
        b.add(format!("institutions {inst:.0}%"), 5.0);
    } else if inst < 10.0 {
        b.add("few institutions", -2.0);
    }

    let rs = snap.rs_rating_or_default();
    if rs > 90.0 {
        b.add(format!("RS {rs:.0} leader"), 10.0);
    } else if rs > 80.0 {
        b.add(format!("RS {rs:.0}"), 5.0);
    }

    adjustment(Horizon::Long, ctx.regime)(snap, risk, &mut b);
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::RegimeLevel;
    use crate::scoring::test_support::*;
    use crate::scoring::{score as score_horizon, EtfPerformanceMap, UniverseStats};
    use crate::snapshot::Fundamentals;

    #[test]
    fn collapsed_chart_short_circuits() {
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let snap = InstrumentSnapshot {
            price: 45.0,
            high52: 100.0,
            ret_1y: 40.0,
            ret_6mo: 30.0,
            ret_3mo: 10.0,
            rs_rating: Some(99.0),
            ..plain("NVDA")
        };
        for regime in RegimeLevel::ALL {
            let ctx = ScoringContext {
                sectors: &sectors,
                etf_performance: &etfs,
                stats: &stats,
                regime,
            };
            let result = score_horizon(Horizon::Long, &snap, &ctx);
            assert_eq!(result.score, 0.0);
            assert_eq!(labels(&result), vec![COLLAPSED_CHART]);
        }
    }

    #[test]
    fn deep_correction_is_softer() {
        let snap = InstrumentSnapshot {
            price: 55.0,
            high52: 100.0,
            ret_1y: 25.0,
            ..plain("NVDA")
        };
        assert!(!is_collapsed_chart(&snap));
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let ctx = ScoringContext {
            sectors: &sectors,
            etf_performance: &etfs,
            stats: &stats,
            regime: RegimeLevel::Neutral,
        };
        let result = score_horizon(Horizon::Long, &snap, &ctx);
        assert!(labels(&result).contains(&"deep correction"));
    }

    #[test]
    fn quality_compounder() {
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let ctx = ScoringContext {
            sectors: &sectors,
            etf_performance: &etfs,
            stats: &stats,
            regime: RegimeLevel::Neutral,
        };
        let snap = InstrumentSnapshot {
            ret_1y: 60.0,
            ret_6mo: 30.0,
            ret_3mo: 10.0,
            ret_ytd: 20.0,
            sma200: Some(80.0),
            max_drawdown: 15.0,
            rs_rating: Some(95.0),
            fundamentals: Fundamentals {
                beta: Some(1.4),
                short_ratio: Some(3.0),
                institutional_ownership: Some(0.5),
            },
            ..plain("AVGO")
        };
        let result = score_horizon(Horizon::Long, &snap, &ctx);
        // 30 stability + 20 1y + 10 sma200 + 10 beta + 4 short + 1.5 rvol
        // + 5 low risk + 5 institutions + 10 RS
        assert!((result.score - 95.5).abs() < 1e-9, "{}", result.score);
    }

    #[test]
    fn extreme_fear_demands_stability() {
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let snap = InstrumentSnapshot {
            ret_1y: 60.0,
            ret_6mo: 30.0,
            ret_3mo: 10.0,
            max_drawdown: 45.0,
            ..plain("NVDA")
        };
        let at = |regime| {
            let ctx = ScoringContext {
                sectors: &sectors,
                etf_performance: &etfs,
                stats: &stats,
                regime,
            };
            score_horizon(Horizon::Long, &snap, &ctx).score
        };
        let neutral = at(RegimeLevel::Neutral);
        assert!((at(RegimeLevel::ExtremeGreed) - neutral - 10.0).abs() < 1e-9);
        assert!((at(RegimeLevel::Greed) - neutral - 5.0).abs() < 1e-9);
        assert!((neutral - at(RegimeLevel::Fear) - 25.0).abs() < 1e-9);
        assert!((neutral - at(RegimeLevel::ExtremeFear) - 45.0).abs() < 1e-9);
    }
}
