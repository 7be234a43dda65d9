//! Short horizon (swing): volume, new highs, 5-day momentum.

use super::regime::adjustment;
use super::{normalize, Breakdown, Horizon, ScoringContext};
use crate::snapshot::InstrumentSnapshot;

const RVOL_CAP: f64 = 5.0;

pub(super) fn score(snap: &InstrumentSnapshot, risk: u32, ctx: &ScoringContext<'_>) -> Breakdown {
    let mut b = Breakdown::default();
    let ret_5d = snap.ret_5d;

    let rvol = snap.rvol.min(RVOL_CAP);
    b.add(format!("RVOL {rvol:.1}x"), 0.30 * normalize(rvol, 0.5, RVOL_CAP));

    if snap.high52 > 0.0 {
        let proximity = snap.price / snap.high52 * 100.0;
        if proximity >= 100.0 {
            b.add("new 52-week high", 20.0);
        } else {
            b.add(
                format!("near high ({proximity:.1}%)"),
                0.20 * normalize(proximity, 80.0, 100.0),
            );
        }
    }

    let label = format!("5d {ret_5d:.1}%");
    if ret_5d > 60.0 {
        b.add(format!("{label} overheated"), -10.0);
    } else if ret_5d > 40.0 {
        b.add(format!("{label} extended"), 0.0);
    } else if ret_5d > 20.0 {
        b.add(format!("{label} surging"), 15.0);
    } else if ret_5d > 10.0 {
        b.add(format!("{label} sweet spot"), 20.0);
    } else if ret_5d > 5.0 {
        b.add(format!("{label} starting"), 10.0);
    } else if ret_5d > 0.0 {
        b.add(format!("{label} drifting up"), 5.0);
    }

    let rsi = snap.rsi;
    if (50.0..=75.0).contains(&rsi) {
        b.add(format!("RSI {rsi:.0} healthy"), 10.0);
    } else if rsi > 75.0 && rsi <= 90.0 {
        b.add(format!("RSI {rsi:.0} strong"), 5.0);
    } else if rsi > 90.0 {
        b.add(format!("RSI {rsi:.0} overheated"), -10.0);
    } else if (40.0..50.0).contains(&rsi) {
        b.add(format!("RSI {rsi:.0} neutral"), 5.0);
    } else {
        b.add(format!("RSI {rsi:.0} weak"), 2.0);
    }

    if snap.above_sma50 {
        b.add("above SMA50", 5.0);
    }
    if snap.has_news {
        b.add("news", 10.0);
    }

    if let Some(etf) = ctx.sector_etf(&snap.symbol) {
        b.add(
            format!("sector 5d {:.1}%", etf.ret_5d),
            0.05 * normalize(etf.ret_5d, -5.0, 10.0),
        );
        let alpha = ret_5d - etf.ret_5d;
        if alpha > 5.0 {
            b.add(format!("beats sector by {alpha:.1}%"), 5.0);
        } else if alpha < -5.0 {
            b.add(format!("lags sector by {:.1}%", -alpha), -5.0);
        }
    }

    // volume without price follow-through
    if snap.rvol > 3.0 && ret_5d < 2.0 {
        b.add("churn: heavy volume, no progress", -15.0);
    } else if snap.rvol > 1.5 && ret_5d < 2.0 {
        b.add("volume up, price flat", -12.0);
    } else if snap.rvol > 1.2 && ret_5d < 0.0 {
        b.add("selling pressure", -8.0);
    }

    if risk > 70 {
        b.add(format!("crash risk {risk}"), -0.10 * f64::from(risk));
    }

    adjustment(Horizon::Short, ctx.regime)(snap, risk, &mut b);
    b
}

#[cfg(test)]
mod tests {
    use crate::regime::RegimeLevel;
    use crate::scoring::test_support::*;
    use crate::scoring::*;

    fn ctx<'a>(
        sectors: &'a SectorMap,
        etfs: &'a EtfPerformanceMap,
        stats: &'a UniverseStats,
        regime: RegimeLevel,
    ) -> ScoringContext<'a> {
        ScoringContext {
            sectors,
            etf_performance: etfs,
            stats,
            regime,
        }
    }

    #[test]
    fn sweet_spot_breakout_scores_high() {
        let sectors = sectors();
        let mut etfs = EtfPerformanceMap::new();
        etfs.insert(
            "SMH".into(),
            EtfPerformance {
                ret_5d: 2.5,
                ..Default::default()
            },
        );
        let stats = UniverseStats::default();
        let snap = InstrumentSnapshot {
            ret_5d: 15.0,
            rvol: 5.0,
            rsi: 65.0,
            above_sma50: true,
            has_news: true,
            ..plain("NVDA")
        };
        let result = score(
            Horizon::Short,
            &snap,
            &ctx(&sectors, &etfs, &stats, RegimeLevel::Neutral),
        );
        // 30 rvol + 20 high + 20 5d + 10 rsi + 5 sma + 10 news + 2.5 sector + 5 alpha
        assert!((result.score - 102.5).abs() < 1e-9, "{}", result.score);
        assert!(labels(&result).contains(&"new 52-week high"));
    }

    #[test]
    fn greed_trap_penalised() {
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let snap = InstrumentSnapshot {
            ret_5d: -3.0,
            rvol: 2.0,
            ..plain("XOM")
        };
        let neutral = score(
            Horizon::Short,
            &snap,
            &ctx(&sectors, &etfs, &stats, RegimeLevel::Neutral),
        );
        let greed = score(
            Horizon::Short,
            &snap,
            &ctx(&sectors, &etfs, &stats, RegimeLevel::Greed),
        );
        assert!(labels(&greed).contains(&"greed trap"));
        assert!((greed.score - (neutral.score + 5.0 - 15.0).max(0.0)).abs() < 1e-9);
    }
}
