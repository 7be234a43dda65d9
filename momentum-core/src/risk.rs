//! Crash-risk estimator: additive, capped risk factors on a snapshot.

use crate::snapshot::InstrumentSnapshot;

pub const MAX_CRASH_RISK: u32 = 100;

/// Risk score 0–100; higher is riskier.
pub fn crash_risk(snap: &InstrumentSnapshot) -> u32 {
    let mut risk = 0;

    risk += if snap.rsi > 90.0 {
        25
    } else if snap.rsi > 85.0 {
        10
    } else {
        0
    };

    risk += if snap.sma50_deviation > 50.0 {
        25
    } else if snap.sma50_deviation > 40.0 {
        15
    } else if snap.sma50_deviation > 30.0 {
        5
    } else {
        0
    };

    // rally without volume
    risk += if snap.ret_5d > 10.0 && snap.rvol < 0.8 {
        20
    } else if snap.ret_5d > 5.0 && snap.rvol < 0.7 {
        10
    } else {
        0
    };

    let beta = snap.fundamentals.beta();
    risk += if beta > 4.0 {
        15
    } else if beta > 3.5 {
        5
    } else {
        0
    };

    // dead-cat bounce
    if snap.ret_3mo < -20.0 && snap.ret_1mo > 0.0 && snap.ret_1mo < 10.0 {
        risk += 15;
    }

    risk.min(MAX_CRASH_RISK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Fundamentals;

    fn calm() -> InstrumentSnapshot {
        InstrumentSnapshot {
            rsi: 55.0,
            rvol: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn calm_instrument_has_no_risk() {
        assert_eq!(crash_risk(&calm()), 0);
    }

    #[test]
    fn overheated_and_overextended() {
        let snap = InstrumentSnapshot {
            rsi: 95.0,
            sma50_deviation: 55.0,
            ..calm()
        };
        assert_eq!(crash_risk(&snap), 50);
    }

    #[test]
    fn missing_beta_defaults_to_market() {
        let mut snap = calm();
        assert_eq!(crash_risk(&snap), 0);
        snap.fundamentals = Fundamentals {
            beta: Some(4.5),
            ..Default::default()
        };
        assert_eq!(crash_risk(&snap), 15);
    }

    #[test]
    fn volumeless_rally_and_dead_cat() {
        let snap = InstrumentSnapshot {
            ret_5d: 12.0,
            rvol: 0.5,
            ..calm()
        };
        assert_eq!(crash_risk(&snap), 20);

        let snap = InstrumentSnapshot {
            ret_3mo: -30.0,
            ret_1mo: 4.0,
            ..calm()
        };
        assert_eq!(crash_risk(&snap), 15);
    }

    #[test]
    fn total_is_capped() {
        let snap = InstrumentSnapshot {
            rsi: 95.0,
            sma50_deviation: 80.0,
            ret_5d: 20.0,
            rvol: 0.1,
            ret_3mo: -40.0,
            ret_1mo: 5.0,
            fundamentals: Fundamentals {
                beta: Some(5.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(crash_risk(&snap), MAX_CRASH_RISK);
    }
}
