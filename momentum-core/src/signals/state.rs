//! Scan state and its single-day transition.
//!
//! `FLAT -> OPEN(1..=max_open_buys)` on buys, back to `FLAT` on a sell. Both the
//! full-history scan and the latest-day scan fold `step` over days; they differ
//! only in how the starting state is obtained.

use serde::{Deserialize, Serialize};

use super::conditions::{DayConditions, Trigger};

/// Most buys one bullish run may stack.
pub const MAX_OPEN_BUYS: u32 = 3;

/// Cooldown lengths and position cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRules {
    /// Sessions a buy blocks further buys for.
    pub buy_cooldown: u32,
    /// Sessions a sell blocks further sells for.
    pub sell_cooldown: u32,
    /// Maximum buys within one bullish run.
    pub max_open_buys: u32,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            buy_cooldown: 5,
            sell_cooldown: 5,
            max_open_buys: MAX_OPEN_BUYS,
        }
    }
}

/// Per-instrument scan state. Lives only for one scan call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
    /// Sessions until buys are allowed again; 0 = ready.
    pub buy_cooldown: u32,
    /// Sessions until sells are allowed again; 0 = ready.
    pub sell_cooldown: u32,
    pub open_buys: u32,
}

impl ScanState {
    pub fn is_flat(&self) -> bool {
        self.open_buys == 0
    }
}

/// Advance one day.
///
/// Order: both cooldowns tick down; a sell candidate with the sell cooldown
/// elapsed consumes the day (emitting only when a position is open); otherwise a
/// buy candidate fires if the buy cooldown elapsed and the position cap allows.
pub fn step(
    state: ScanState,
    rules: &ScanRules,
    day: &DayConditions,
) -> (ScanState, Option<Trigger>) {
    let mut next = ScanState {
        buy_cooldown: state.buy_cooldown.saturating_sub(1),
        sell_cooldown: state.sell_cooldown.saturating_sub(1),
        open_buys: state.open_buys,
    };

    if next.sell_cooldown == 0 {
        if let Some(trigger) = day.sell_trigger() {
            if next.is_flat() {
                return (next, None);
            }
            next = ScanState {
                buy_cooldown: 0,
                sell_cooldown: rules.sell_cooldown,
                open_buys: 0,
            };
            return (next, Some(trigger));
        }
    }

    if next.buy_cooldown == 0 && next.open_buys < rules.max_open_buys {
        if let Some(trigger) = day.buy_trigger() {
            next.buy_cooldown = rules.buy_cooldown;
            next.open_buys += 1;
            return (next, Some(trigger));
        }
    }

    (next, None)
}
