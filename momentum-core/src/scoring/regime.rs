//! Regime-conditional adjustments, one table row per horizon.

use super::{Breakdown, Horizon};
use crate::regime::RegimeLevel;
use crate::snapshot::InstrumentSnapshot;

/// Applied after a horizon's base terms; receives the crash risk.
pub type RegimeAdjustment = fn(&InstrumentSnapshot, u32, &mut Breakdown);

const SHORT: [RegimeAdjustment; 5] = [short_greed, short_greed, none, short_fear, short_extreme_fear];
const MID: [RegimeAdjustment; 5] = [mid_greed, mid_greed, none, mid_fear, mid_extreme_fear];
const LONG: [RegimeAdjustment; 5] = [
    long_extreme_greed,
    long_greed,
    none,
    long_fear,
    long_extreme_fear,
];

fn level_index(level: RegimeLevel) -> usize {
    match level {
        RegimeLevel::ExtremeGreed => 0,
        RegimeLevel::Greed => 1,
        RegimeLevel::Neutral => 2,
        RegimeLevel::Fear => 3,
        RegimeLevel::ExtremeFear => 4,
    }
}

pub fn adjustment(horizon: Horizon, level: RegimeLevel) -> RegimeAdjustment {
    let table = match horizon {
        Horizon::Short => &SHORT,
        Horizon::Mid => &MID,
        Horizon::Long => &LONG,
    };
    table[level_index(level)]
}

fn none(_: &InstrumentSnapshot, _: u32, _: &mut Breakdown) {}

fn short_greed(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.rvol > 3.0 && snap.ret_5d > 2.0 {
        b.add("greed: explosive volume with price", 15.0);
    } else if snap.rvol > 2.0 && snap.ret_5d > 0.0 {
        b.add("greed: volume with price", 5.0);
    }
    b.add("greed bonus", 5.0);
    if snap.rvol > 1.5 && snap.ret_5d < 0.0 {
        b.add("greed trap", -15.0);
    }
}

fn short_fear(_: &InstrumentSnapshot, risk: u32, b: &mut Breakdown) {
    if risk > 50 {
        b.add("fear: volatility penalty", -20.0);
    }
}

fn short_extreme_fear(snap: &InstrumentSnapshot, risk: u32, b: &mut Breakdown) {
    short_fear(snap, risk, b);
    if risk > 30 {
        b.add("extreme fear: safety first", -30.0);
    }
}

fn mid_greed(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.rvol > 2.0 && snap.ret_1mo > 0.0 {
        b.add("greed: volume with price", 10.0);
    }
    if snap.rvol > 1.5 && snap.ret_1mo < 0.0 {
        b.add("greed trap", -15.0);
    }
}

fn mid_fear(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.rsi > 70.0 {
        b.add("fear: overbought", -10.0);
    }
}

fn mid_extreme_fear(snap: &InstrumentSnapshot, risk: u32, b: &mut Breakdown) {
    mid_fear(snap, risk, b);
    b.add("extreme fear mode", 0.0);
}

fn long_extreme_greed(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.max_drawdown > 40.0 {
        b.add("extreme greed: volatility forgiven", 10.0);
    }
}

fn long_greed(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.max_drawdown > 40.0 {
        b.add("greed: volatility forgiven", 5.0);
    }
}

fn long_fear(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.max_drawdown > 40.0 {
        b.add("fear: volatility penalty", -20.0);
    }
    if snap.fundamentals.institutional_pct() < 20.0 {
        b.add("fear: thin institutional support", -5.0);
    }
}

fn long_extreme_fear(snap: &InstrumentSnapshot, _: u32, b: &mut Breakdown) {
    if snap.max_drawdown > 30.0 {
        b.add("extreme fear: volatility excluded", -35.0);
    }
    if snap.fundamentals.institutional_pct() < 40.0 {
        b.add("extreme fear: low conviction holders", -10.0);
    }
    if snap.fundamentals.beta() > 1.2 {
        b.add("extreme fear: high beta", -10.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_leaves_scores_alone() {
        let snap = InstrumentSnapshot {
            rvol: 4.0,
            ret_5d: 10.0,
            max_drawdown: 80.0,
            ..Default::default()
        };
        for horizon in Horizon::ALL {
            let mut b = Breakdown::default();
            adjustment(horizon, RegimeLevel::Neutral)(&snap, 90, &mut b);
            assert_eq!(b.score(), 0.0);
        }
    }

    #[test]
    fn greed_trap_contributions_sum_to_score() {
        let snap = InstrumentSnapshot {
            rvol: 2.0,
            ret_5d: -1.0,
            ..Default::default()
        };
        let mut b = Breakdown::default();
        b.add("base", -20.0);
        adjustment(Horizon::Short, RegimeLevel::Greed)(&snap, 0, &mut b);
        assert_eq!(b.score(), -30.0);
        let total: f64 = b.contributions.iter().map(|c| c.delta).sum();
        assert_eq!(total, b.score());

        let result = b.finish("ABC", Horizon::Short, 0);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn extreme_fear_stacks_penalties() {
        let snap = InstrumentSnapshot::default();
        let mut b = Breakdown::default();
        adjustment(Horizon::Short, RegimeLevel::ExtremeFear)(&snap, 60, &mut b);
        assert_eq!(b.score(), -50.0);
    }
}
