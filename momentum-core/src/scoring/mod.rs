//! Horizon scoring: three composite scorers with an auditable breakdown.
//!
//! Each scorer adds bucketed sub-scores into a [`Breakdown`], then the
//! regime adjustment for its horizon runs, then the total is floored at zero.

pub mod alternatives;
mod long;
mod mid;
pub mod picks;
pub mod regime;
mod short;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::regime::RegimeLevel;
use crate::risk::crash_risk;
use crate::snapshot::InstrumentSnapshot;
use crate::universe::SectorMap;

pub use alternatives::{better_alternatives, Alternative};
pub use picks::{recommendation_reason, top_picks, HorizonPicks, Pick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Short,
    Mid,
    Long,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Self::Short, Self::Mid, Self::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Mid => "mid",
            Self::Long => "long",
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled term of a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub label: String,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub symbol: String,
    pub horizon: Horizon,
    pub score: f64,
    pub contributions: Vec<Contribution>,
    pub crash_risk: u32,
}

/// Running total plus the ordered list of terms that produced it.
#[derive(Debug, Clone, Default)]
pub struct Breakdown {
    score: f64,
    contributions: Vec<Contribution>,
}

impl Breakdown {
    pub fn add(&mut self, label: impl Into<String>, delta: f64) {
        self.score += delta;
        self.contributions.push(Contribution {
            label: label.into(),
            delta,
        });
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Contributions stay as listed; only the reported score is floored at zero.
    fn finish(self, symbol: &str, horizon: Horizon, crash_risk: u32) -> ScoreResult {
        ScoreResult {
            symbol: symbol.to_string(),
            horizon,
            score: self.score.max(0.0),
            contributions: self.contributions,
            crash_risk,
        }
    }
}

/// Min–max normalisation to 0–100; 50 for an empty range.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 50.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// Observed range of a metric across the scored universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.filter(|v| v.is_finite()).fold(None, |acc, v| {
            Some(match acc {
                None => Range { min: v, max: v },
                Some(r) => Range {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }

    pub fn normalize(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

/// Cross-instrument ranges for the min–max normalised sub-scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseStats {
    pub ret_3mo: Option<Range>,
    pub ret_ytd: Option<Range>,
}

impl UniverseStats {
    pub fn from_snapshots<'a>(snapshots: impl IntoIterator<Item = &'a InstrumentSnapshot>) -> Self {
        let snapshots: Vec<&InstrumentSnapshot> = snapshots.into_iter().collect();
        Self {
            ret_3mo: Range::of(snapshots.iter().map(|s| s.ret_3mo)),
            ret_ytd: Range::of(snapshots.iter().map(|s| s.ret_ytd)),
        }
    }
}

/// Sector ETF returns used for tailwind and relative-strength terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EtfPerformance {
    pub ret_5d: f64,
    pub ret_1mo: f64,
    pub ret_ytd: f64,
}

impl EtfPerformance {
    pub fn from_snapshot(snap: &InstrumentSnapshot) -> Self {
        Self {
            ret_5d: snap.ret_5d,
            ret_1mo: snap.ret_1mo,
            ret_ytd: snap.ret_ytd,
        }
    }
}

pub type EtfPerformanceMap = HashMap<String, EtfPerformance>;

/// Everything a scorer reads besides the instrument itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub sectors: &'a SectorMap,
    pub etf_performance: &'a EtfPerformanceMap,
    pub stats: &'a UniverseStats,
    pub regime: RegimeLevel,
}

impl ScoringContext<'_> {
    /// Performance of the ETF mapped to the instrument's sector.
    pub fn sector_etf(&self, symbol: &str) -> Option<&EtfPerformance> {
        let etf = self.sectors.etf_for(symbol)?;
        self.etf_performance.get(etf)
    }
}

/// Score one instrument on one horizon.
pub fn score(horizon: Horizon, snap: &InstrumentSnapshot, ctx: &ScoringContext<'_>) -> ScoreResult {
    let risk = crash_risk(snap);
    let breakdown = match horizon {
        Horizon::Short => short::score(snap, risk, ctx),
        Horizon::Mid => mid::score(snap, risk, ctx),
        Horizon::Long => long::score(snap, risk, ctx),
    };
    breakdown.finish(&snap.symbol, horizon, risk)
}

pub fn score_all(snap: &InstrumentSnapshot, ctx: &ScoringContext<'_>) -> [ScoreResult; 3] {
    Horizon::ALL.map(|h| score(h, snap, ctx))
}

/// Assign RS ratings: percentile rank of the 1-year return times 99,
/// ties sharing their average rank.
pub fn assign_rs_ratings(snapshots: &mut [InstrumentSnapshot]) {
    let n = snapshots.len();
    if n == 0 {
        return;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| snapshots[a].ret_1y.total_cmp(&snapshots[b].ret_1y));

    let mut start = 0;
    while start < n {
        let value = snapshots[order[start]].ret_1y;
        let mut end = start + 1;
        while end < n && snapshots[order[end]].ret_1y == value {
            end += 1;
        }
        // ranks are 1-based; the tie group spans start+1..=end
        let average_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            snapshots[idx].rs_rating = Some(average_rank / n as f64 * 99.0);
        }
        start = end;
    }
}
