//! Stronger names from the same sector.

use serde::{Deserialize, Serialize};

use super::{score, Horizon, ScoringContext};
use crate::snapshot::InstrumentSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub symbol: String,
    /// Mid-horizon score plus buy power; the ranking key.
    pub score: f64,
    pub mid_score: f64,
    pub buy_power: f64,
    pub ret_1mo: f64,
    pub rvol: f64,
}

/// How buyable a name looks right now: trend, demand and RSI zone.
pub fn buy_power(snap: &InstrumentSnapshot) -> f64 {
    let mut power = 0.0;
    if snap.ret_1mo > 0.0 && snap.ret_3mo > 0.0 {
        power += 20.0;
    }
    if snap.rvol > 1.5 {
        power += 30.0;
    }
    if (50.0..=75.0).contains(&snap.rsi) {
        power += 30.0;
    } else if snap.rsi > 85.0 {
        power -= 20.0;
    }
    power
}

/// Other members of `symbol`'s sector ranked best-first. Empty when the
/// symbol has no sector.
pub fn better_alternatives(
    symbol: &str,
    snapshots: &[InstrumentSnapshot],
    ctx: &ScoringContext<'_>,
    top_n: usize,
) -> Vec<Alternative> {
    let Some(sector) = ctx.sectors.sector_of(symbol) else {
        return Vec::new();
    };

    let mut candidates: Vec<Alternative> = snapshots
        .iter()
        .filter(|s| !s.symbol.eq_ignore_ascii_case(symbol))
        .filter(|s| ctx.sectors.sector_of(&s.symbol) == Some(sector))
        .filter(|s| s.price > 0.0)
        .map(|s| {
            let mid_score = score(Horizon::Mid, s, ctx).score;
            let power = buy_power(s);
            Alternative {
                symbol: s.symbol.clone(),
                score: mid_score + power,
                mid_score,
                buy_power: power,
                ret_1mo: s.ret_1mo,
                rvol: s.rvol,
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_n);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::RegimeLevel;
    use crate::scoring::test_support::*;
    use crate::scoring::{EtfPerformanceMap, UniverseStats};

    #[test]
    fn buy_power_zones() {
        let base = InstrumentSnapshot::default();
        assert_eq!(buy_power(&base), 0.0);
        let ideal = InstrumentSnapshot {
            ret_1mo: 5.0,
            ret_3mo: 10.0,
            rvol: 2.0,
            rsi: 60.0,
            ..Default::default()
        };
        assert_eq!(buy_power(&ideal), 80.0);
        let hot = InstrumentSnapshot {
            rsi: 90.0,
            ..Default::default()
        };
        assert_eq!(buy_power(&hot), -20.0);
    }

    #[test]
    fn same_sector_only_excluding_self() {
        let sectors = sectors();
        let etfs = EtfPerformanceMap::new();
        let stats = UniverseStats::default();
        let ctx = ScoringContext {
            sectors: &sectors,
            etf_performance: &etfs,
            stats: &stats,
            regime: RegimeLevel::Neutral,
        };
        let strong = InstrumentSnapshot {
            ret_1mo: 25.0,
            ret_3mo: 30.0,
            rvol: 2.0,
            rsi: 60.0,
            ..plain("AVGO")
        };
        let snaps = vec![plain("NVDA"), plain("AMD"), strong, plain("XOM")];
        let alts = better_alternatives("nvda", &snaps, &ctx, 5);
        let symbols: Vec<&str> = alts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AVGO", "AMD"]);
        assert!(better_alternatives("ZZZZ", &snaps, &ctx, 5).is_empty());
    }
}
