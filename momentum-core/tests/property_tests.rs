//! Property tests for scanner and indicator invariants.
//!
//! Uses proptest to verify:
//! 1. Open buys stay within [0, max] and drop to 0 on every sell
//! 2. No sell is emitted from a flat state
//! 3. RSI and MFI stay in [0, 100]; relative volume is never negative
//! 4. Building a frame twice from the same bars gives identical values

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use momentum_core::domain::Bar;
use momentum_core::indicators::IndicatorFrame;
use momentum_core::signals::{
    scan_full, step, DayConditions, ProfitKind, ReversalKind, ScanRules, ScanState,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_day() -> impl Strategy<Value = DayConditions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(breakout, reversal, reentry, stop, profit)| DayConditions {
            breakout,
            reversal: reversal.then_some(ReversalKind::EarlyTurn),
            reentry,
            stop,
            profit: profit.then_some(ProfitKind::RsiClimax),
        },
    )
}

fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-4.0..4.0_f64, 0.0..3.0_f64, 100u64..20_000), 1..max_len).prop_map(
        |steps| {
            let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            let mut close: f64 = 100.0;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (change, range, volume))| {
                    let open = close;
                    close = (close + change).max(5.0);
                    Bar {
                        date: start + Duration::days(i as i64),
                        open,
                        high: open.max(close) + range,
                        low: (open.min(close) - range).max(1.0),
                        close,
                        volume,
                    }
                })
                .collect()
        },
    )
}

// ── 1 & 2. State machine bounds ──────────────────────────────────────

proptest! {
    #[test]
    fn open_buys_bounded_and_reset_on_sell(days in prop::collection::vec(arb_day(), 1..200)) {
        let rules = ScanRules::default();
        let mut state = ScanState::default();
        for day in &days {
            let before = state;
            let (next, trigger) = step(state, &rules, day);
            prop_assert!(next.open_buys <= rules.max_open_buys);
            if let Some(t) = trigger {
                if t.kind.is_sell() {
                    prop_assert!(!before.is_flat(), "sell emitted while flat");
                    prop_assert_eq!(next.open_buys, 0);
                } else {
                    prop_assert_eq!(next.open_buys, before.open_buys + 1);
                }
            }
            state = next;
        }
    }

    #[test]
    fn full_scan_never_sells_flat(bars in arb_bars(260)) {
        let frame = IndicatorFrame::build(&bars).unwrap();
        let rules = ScanRules::default();
        let scan = scan_full("P", &frame, &rules);
        let mut open = 0u32;
        for event in &scan.events {
            if event.signal_type.is_sell() {
                prop_assert!(open > 0, "sell at bar {} while flat", event.bar_index);
                open = 0;
            } else {
                open += 1;
                prop_assert!(open <= rules.max_open_buys);
            }
        }
        prop_assert_eq!(open, scan.final_state.open_buys);
    }

    // ── 3. Indicator ranges ──────────────────────────────────────────

    #[test]
    fn oscillators_in_range(bars in arb_bars(200)) {
        let frame = IndicatorFrame::build(&bars).unwrap();
        for i in 0..frame.len() {
            let row = frame.row(i).unwrap();
            prop_assert!((0.0..=100.0).contains(&row.rsi), "rsi {} at {i}", row.rsi);
            prop_assert!((0.0..=100.0).contains(&row.mfi), "mfi {} at {i}", row.mfi);
            prop_assert!(row.rvol >= 0.0 && row.rvol.is_finite(), "rvol {} at {i}", row.rvol);
        }
    }

    // ── 4. Idempotence ───────────────────────────────────────────────

    #[test]
    fn frame_build_is_idempotent(bars in arb_bars(150)) {
        let a = IndicatorFrame::build(&bars).unwrap();
        let b = IndicatorFrame::build(&bars).unwrap();
        for name in IndicatorFrame::INDICATOR_COLUMNS {
            let (x, y) = (a.series(name).unwrap(), b.series(name).unwrap());
            for (i, (p, q)) in x.iter().zip(y).enumerate() {
                prop_assert!(
                    p.to_bits() == q.to_bits(),
                    "{name} differs at {i}: {p} vs {q}"
                );
            }
        }
    }
}
