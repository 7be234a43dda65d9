//! Signal scanner: buy/sell events from an instrument's indicator frame.
//!
//! Conditions are evaluated per day from the frame alone; a small state machine
//! (`state::step`) applies cooldowns and the open-position cap. Signals never see
//! scoring, regime, or any other instrument.

pub mod conditions;
pub mod ranking;
pub mod scanner;
pub mod state;
pub mod status;

pub use conditions::{DayConditions, ProfitKind, ReversalKind, Trigger};
pub use ranking::{bull_probability, rank_buy_candidates, RankedSignal};
pub use scanner::{
    check_latest_divergence, scan_full, scan_latest, seed_state, FullScan, LatestDivergence,
    LatestScan,
};
pub use state::{step, ScanRules, ScanState, MAX_OPEN_BUYS};
pub use status::{analyze, quick_score, Analysis, AnalysisStatus};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::FrameRow;

/// Discriminated event type, serialized as a stable snake_case tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Breakout,
    Reversal,
    Reentry,
    SellStop,
    SellProfit,
}

impl SignalType {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Breakout | Self::Reversal | Self::Reentry)
    }

    pub fn is_sell(self) -> bool {
        !self.is_buy()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakout => "breakout",
            Self::Reversal => "reversal",
            Self::Reentry => "reentry",
            Self::SellStop => "sell_stop",
            Self::SellProfit => "sell_profit",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emitted signal. Immutable once produced; at most one per instrument per date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub bar_index: usize,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub reason: String,
    pub price: f64,
    /// Indicator values on the trigger day.
    pub snapshot: FrameRow,
}
