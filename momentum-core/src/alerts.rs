//! Opportunity alerts: persistent leaders with a volume spike today.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::IndicatorFrame;
use crate::snapshot::{Fundamentals, InstrumentSnapshot};

pub const ALERT_MIN_RVOL: f64 = 2.0;
pub const DEFAULT_ALERT_TOP_N: usize = 10;
/// Today plus the two sessions before it.
const PERSISTENCE_SESSIONS: usize = 3;

/// Return horizon used to rank leaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[default]
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    OneYear,
}

impl ReturnPeriod {
    pub fn of(self, snap: &InstrumentSnapshot) -> f64 {
        match self {
            Self::OneDay => snap.ret_1d,
            Self::FiveDays => snap.ret_5d,
            Self::OneMonth => snap.ret_1mo,
            Self::ThreeMonths => snap.ret_3mo,
            Self::SixMonths => snap.ret_6mo,
            Self::YearToDate => snap.ret_ytd,
            Self::OneYear => snap.ret_1y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityAlert {
    pub symbol: String,
    pub gain: f64,
    pub rvol: f64,
}

/// Symbols in the top `top_n` by `period` as of `sessions_back` sessions ago.
fn leaders(
    frames: &[(&str, &IndicatorFrame)],
    period: ReturnPeriod,
    top_n: usize,
    sessions_back: usize,
) -> Vec<InstrumentSnapshot> {
    let mut snaps: Vec<InstrumentSnapshot> = frames
        .iter()
        .filter_map(|(symbol, frame)| {
            let end = frame.len().checked_sub(1 + sessions_back)?;
            InstrumentSnapshot::at(symbol, frame, end, Fundamentals::default())
        })
        .collect();
    snaps.sort_by(|a, b| period.of(b).total_cmp(&period.of(a)));
    snaps.truncate(top_n);
    snaps
}

/// Instruments ranked in the top `top_n` on each of the last three sessions
/// whose relative volume today is at least 2. Instruments with fewer than
/// three sessions are ignored. Sorted by gain, best first.
pub fn opportunity_alerts(
    frames: &[(&str, &IndicatorFrame)],
    period: ReturnPeriod,
    top_n: usize,
) -> Vec<OpportunityAlert> {
    let eligible: Vec<(&str, &IndicatorFrame)> = frames
        .iter()
        .copied()
        .filter(|(_, frame)| frame.len() >= PERSISTENCE_SESSIONS)
        .collect();
    if eligible.is_empty() {
        return Vec::new();
    }

    let today = leaders(&eligible, period, top_n, 0);
    let mut persistent: HashSet<String> = today.iter().map(|s| s.symbol.clone()).collect();
    for back in 1..PERSISTENCE_SESSIONS {
        let earlier: HashSet<String> = leaders(&eligible, period, top_n, back)
            .into_iter()
            .map(|s| s.symbol)
            .collect();
        persistent.retain(|s| earlier.contains(s));
    }

    let mut alerts: Vec<OpportunityAlert> = today
        .into_iter()
        .filter(|s| persistent.contains(&s.symbol) && s.rvol >= ALERT_MIN_RVOL)
        .map(|s| OpportunityAlert {
            gain: period.of(&s),
            rvol: s.rvol,
            symbol: s.symbol,
        })
        .collect();
    alerts.sort_by(|a, b| b.gain.total_cmp(&a.gain));
    debug!(count = alerts.len(), ?period, "opportunity alerts");
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::make_bars;

    fn with_last_volume(mut bars: Vec<Bar>, volume: u64) -> Vec<Bar> {
        if let Some(last) = bars.last_mut() {
            last.volume = volume;
        }
        bars
    }

    fn trend(step: f64) -> Vec<Bar> {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + step * i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn persistent_leader_with_volume_alerts() {
        let leader = IndicatorFrame::build(&with_last_volume(trend(2.0), 5000)).unwrap();
        let quiet_leader = IndicatorFrame::build(&trend(1.5)).unwrap();
        let laggard = IndicatorFrame::build(&with_last_volume(trend(-0.5), 5000)).unwrap();
        let frames = [
            ("LEAD", &leader),
            ("QUIET", &quiet_leader),
            ("LAG", &laggard),
        ];

        let alerts = opportunity_alerts(&frames, ReturnPeriod::FiveDays, 2);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].symbol, "LEAD");
        assert!((alerts[0].rvol - 5.0).abs() < 1e-9);
    }

    #[test]
    fn short_histories_are_ignored() {
        let tiny = IndicatorFrame::build(&make_bars(&[1.0, 2.0])).unwrap();
        assert!(opportunity_alerts(&[("TINY", &tiny)], ReturnPeriod::OneDay, 5).is_empty());
    }

    #[test]
    fn period_names() {
        assert_eq!(serde_json::to_string(&ReturnPeriod::OneMonth).unwrap(), "\"1mo\"");
        assert_eq!(ReturnPeriod::default(), ReturnPeriod::ThreeMonths);
    }
}
