//! Mid horizon (1–3 months): monthly momentum, trend, squeeze energy.

use super::regime::adjustment;
use super::{normalize, Breakdown, Horizon, ScoringContext};
use crate::snapshot::InstrumentSnapshot;

pub(super) fn score(snap: &InstrumentSnapshot, risk: u32, ctx: &ScoringContext<'_>) -> Breakdown {
    let mut b = Breakdown::default();
    let ret_1mo = snap.ret_1mo;

    let label = format!("1mo {ret_1mo:.1}%");
    if ret_1mo > 100.0 {
        b.add(format!("{label} overheated"), -10.0);
    } else if ret_1mo > 70.0 {
        b.add(format!("{label} spiking"), 5.0);
    } else if ret_1mo > 40.0 {
        b.add(format!("{label} strong"), 15.0);
    } else if ret_1mo > 20.0 {
        b.add(format!("{label} sweet spot"), 25.0);
    } else if ret_1mo > 5.0 {
        b.add(format!("{label} steady"), 10.0);
    }

    if let Some(range) = ctx.stats.ret_3mo {
        b.add(
            format!("3mo {:.1}%", snap.ret_3mo),
            0.15 * range.normalize(snap.ret_3mo),
        );
    }

    if snap.golden_cross {
        b.add("golden cross", 15.0);
    } else if snap.above_sma50 {
        b.add("above SMA50", 10.5);
    }

    if snap.is_squeeze {
        if snap.squeeze_days >= 3 {
            b.add(format!("squeeze ({} days)", snap.squeeze_days), 20.0);
        } else {
            b.add("squeeze", 15.0);
        }
    } else if snap.bb_width < 0.1 {
        b.add("very narrow bands", 12.0);
    } else if snap.bb_width < 0.2 {
        b.add("narrow bands", 7.5);
    } else {
        b.add("wide bands", 4.5);
    }

    let rsi = snap.rsi;
    if (50.0..=75.0).contains(&rsi) {
        b.add(format!("RSI {rsi:.0} healthy"), 10.0);
    } else if rsi > 75.0 && rsi <= 85.0 {
        b.add(format!("RSI {rsi:.0} warm"), -5.0);
    } else if rsi > 85.0 {
        b.add(format!("RSI {rsi:.0} overheated"), -15.0);
    } else {
        b.add(format!("RSI {rsi:.0} weak"), 4.0);
    }

    if let Some(etf) = ctx.sector_etf(&snap.symbol) {
        b.add(
            format!("sector 1mo {:.1}%", etf.ret_1mo),
            0.10 * normalize(etf.ret_1mo, -10.0, 20.0),
        );
        let alpha = ret_1mo - etf.ret_1mo;
        if alpha > 10.0 {
            b.add(format!("beats sector by {alpha:.1}%"), 5.0);
        } else if alpha < -5.0 {
            b.add(format!("lags sector by {:.1}%", -alpha), -5.0);
        }
    }

    let rvol = snap.rvol;
    let rvol_points = if rvol > 2.0 {
        10.0
    } else if rvol > 1.5 {
        7.0
    } else if rvol > 1.0 {
        5.0
    } else {
        2.0
    };
    b.add(format!("RVOL {rvol:.1}x"), rvol_points);

    // a one-week spike dressed up as a monthly trend
    if ret_1mo > 0.0 && snap.ret_5d > 0.0 {
        let spike_ratio = snap.ret_5d / ret_1mo;
        if spike_ratio > 0.8 {
            b.add("gain concentrated in last 5 days", -15.0);
        } else if spike_ratio > 0.6 {
            b.add("gain mostly in last 5 days", -8.0);
        }
    }

    if rvol > 1.5 && ret_1mo < 5.0 {
        b.add("volume up, price weak", -10.0);
    } else if rvol > 1.3 && ret_1mo < 0.0 {
        b.add("selling into strength", -8.0);
    }
    if rvol > 3.0 && ret_1mo < 3.0 {
        b.add("churn: heavy volume, no progress", -15.0);
    }

    if risk > 70 {
        b.add(format!("crash risk {risk}"), -0.08 * f64::from(risk));
    }

    adjustment(Horizon::Mid, ctx.regime)(snap, risk, &mut b);
    b
}
