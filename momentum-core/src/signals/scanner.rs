//! Full-history and latest-day scans.
//!
//! Both fold `state::step` over days. The full scan starts flat at bar 0; the
//! latest-day scan seeds its state from the trailing trigger history and steps
//! only the last day. The seed is an approximation: it re-reads raw trigger
//! conditions instead of replaying gated state, so it can disagree with the full
//! scan. `check_latest_divergence` reports those disagreements.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::conditions::{DayConditions, Trigger};
use super::state::{step, ScanRules, ScanState};
use super::{SignalEvent, SignalType};
use crate::indicators::IndicatorFrame;

/// Result of replaying an instrument's full history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullScan {
    pub events: Vec<SignalEvent>,
    pub final_state: ScanState,
}

/// Result of the latest-day fast path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestScan {
    pub event: Option<SignalEvent>,
    pub seeded_state: ScanState,
}

/// Latest-day and full-replay verdicts that disagree on the last session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestDivergence {
    pub symbol: String,
    pub date: chrono::NaiveDate,
    pub full: Option<SignalType>,
    pub latest: Option<SignalType>,
}

fn to_event(
    symbol: &str,
    frame: &IndicatorFrame,
    i: usize,
    trigger: Trigger,
) -> Option<SignalEvent> {
    let snapshot = frame.row(i)?;
    Some(SignalEvent {
        symbol: symbol.to_string(),
        date: snapshot.date,
        bar_index: i,
        signal_type: trigger.kind,
        reason: trigger.reason,
        price: snapshot.close,
        snapshot,
    })
}

/// Replay the whole history from a flat state.
pub fn scan_full(symbol: &str, frame: &IndicatorFrame, rules: &ScanRules) -> FullScan {
    let mut state = ScanState::default();
    let mut events = Vec::new();

    for i in 0..frame.len() {
        let day = DayConditions::evaluate(frame, i);
        let (next, trigger) = step(state, rules, &day);
        state = next;
        if let Some(event) = trigger.and_then(|t| to_event(symbol, frame, i, t)) {
            events.push(event);
        }
    }

    debug!(symbol, events = events.len(), "full scan complete");
    FullScan {
        events,
        final_state: state,
    }
}

/// Approximate the state at the end of the session before `last`.
///
/// Cooldowns come from the most recent raw trigger within the cooldown window;
/// open buys count raw buy days since the most recent raw sell day within
/// `position_lookback` sessions, capped at the position limit.
pub fn seed_state(
    frame: &IndicatorFrame,
    last: usize,
    rules: &ScanRules,
    position_lookback: usize,
) -> ScanState {
    let mut state = ScanState::default();
    let earliest = last.saturating_sub(position_lookback);
    let days: Vec<(usize, DayConditions)> = (earliest..last)
        .map(|j| (j, DayConditions::evaluate(frame, j)))
        .collect();

    // Remaining cooldown as of the end of day `last - 1` for a trigger on day `j`.
    let remaining = |length: u32, j: usize| -> u32 {
        let elapsed = (last - 1 - j) as u32;
        length.saturating_sub(elapsed)
    };

    if let Some(&(j, _)) = days.iter().rev().find(|(_, d)| d.has_buy()) {
        state.buy_cooldown = remaining(rules.buy_cooldown, j);
    }
    if let Some(&(j, _)) = days.iter().rev().find(|(_, d)| d.has_sell()) {
        state.sell_cooldown = remaining(rules.sell_cooldown, j);
    }

    let since_sell = days
        .iter()
        .rposition(|(_, d)| d.has_sell())
        .map_or(0, |p| p + 1);
    let buys = days[since_sell..].iter().filter(|(_, d)| d.has_buy()).count() as u32;
    state.open_buys = buys.min(rules.max_open_buys);

    state
}

/// Evaluate only the most recent session, starting from a reconstructed state.
pub fn scan_latest(
    symbol: &str,
    frame: &IndicatorFrame,
    rules: &ScanRules,
    position_lookback: usize,
) -> LatestScan {
    let Some(last) = frame.len().checked_sub(1) else {
        return LatestScan {
            event: None,
            seeded_state: ScanState::default(),
        };
    };

    let seeded_state = seed_state(frame, last, rules, position_lookback);
    let day = DayConditions::evaluate(frame, last);
    let (_, trigger) = step(seeded_state, rules, &day);
    let event = trigger.and_then(|t| to_event(symbol, frame, last, t));

    LatestScan {
        event,
        seeded_state,
    }
}

/// Compare the latest-day verdict with a full replay for the last session.
pub fn check_latest_divergence(
    symbol: &str,
    frame: &IndicatorFrame,
    rules: &ScanRules,
    position_lookback: usize,
) -> Option<LatestDivergence> {
    let last = frame.len().checked_sub(1)?;
    let full = scan_full(symbol, frame, rules)
        .events
        .last()
        .filter(|e| e.bar_index == last)
        .map(|e| e.signal_type);
    let latest = scan_latest(symbol, frame, rules, position_lookback)
        .event
        .map(|e| e.signal_type);

    (full != latest).then(|| LatestDivergence {
        symbol: symbol.to_string(),
        date: frame.dates[last],
        full,
        latest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn empty_frame_scans_cleanly() {
        let frame = IndicatorFrame::build(&[]).unwrap();
        let rules = ScanRules::default();
        assert!(scan_full("X", &frame, &rules).events.is_empty());
        assert!(scan_latest("X", &frame, &rules, 60).event.is_none());
        assert!(check_latest_divergence("X", &frame, &rules, 60).is_none());
    }

    #[test]
    fn flat_history_has_no_events() {
        let frame = IndicatorFrame::build(&make_bars(&[25.0; 120])).unwrap();
        let scan = scan_full("FLAT", &frame, &ScanRules::default());
        assert!(scan.events.is_empty());
        assert_eq!(scan.final_state, ScanState::default());
    }

    #[test]
    fn seed_is_flat_without_triggers() {
        let frame = IndicatorFrame::build(&make_bars(&[25.0; 80])).unwrap();
        let state = seed_state(&frame, 79, &ScanRules::default(), 60);
        assert_eq!(state, ScanState::default());
    }
}
