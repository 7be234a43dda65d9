//! Top picks per horizon with a short recommendation reason.

use serde::{Deserialize, Serialize};

use super::{score, Contribution, Horizon, ScoringContext};
use crate::snapshot::InstrumentSnapshot;

const MAX_REASONS: usize = 4;
const FALLBACK_REASON: &str = "top overall score";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub symbol: String,
    pub sector: Option<String>,
    pub score: f64,
    pub contributions: Vec<Contribution>,
    pub crash_risk: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorizonPicks {
    pub short: Vec<Pick>,
    pub mid: Vec<Pick>,
    pub long: Vec<Pick>,
}

impl HorizonPicks {
    pub fn get(&self, horizon: Horizon) -> &[Pick] {
        match horizon {
            Horizon::Short => &self.short,
            Horizon::Mid => &self.mid,
            Horizon::Long => &self.long,
        }
    }
}

/// Best `top_n` individual stocks for each horizon. ETFs in the sector map
/// are excluded; equal scores keep input order.
pub fn top_picks(
    snapshots: &[InstrumentSnapshot],
    ctx: &ScoringContext<'_>,
    top_n: usize,
) -> HorizonPicks {
    let stocks: Vec<&InstrumentSnapshot> = snapshots
        .iter()
        .filter(|s| !ctx.sectors.is_etf(&s.symbol))
        .collect();

    let rank = |horizon: Horizon| -> Vec<Pick> {
        let mut scored: Vec<(&InstrumentSnapshot, _)> = stocks
            .iter()
            .map(|&snap| (snap, score(horizon, snap, ctx)))
            .collect();
        scored.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        scored
            .into_iter()
            .take(top_n)
            .map(|(snap, result)| Pick {
                symbol: result.symbol,
                sector: ctx.sectors.sector_of(&snap.symbol).map(str::to_string),
                score: result.score,
                contributions: result.contributions,
                crash_risk: result.crash_risk,
                reason: recommendation_reason(snap, horizon, ctx),
            })
            .collect()
    };

    HorizonPicks {
        short: rank(Horizon::Short),
        mid: rank(Horizon::Mid),
        long: rank(Horizon::Long),
    }
}

/// Up to four of the horizon's strongest features, joined with " / ".
pub fn recommendation_reason(
    snap: &InstrumentSnapshot,
    horizon: Horizon,
    ctx: &ScoringContext<'_>,
) -> String {
    let mut reasons: Vec<String> = Vec::new();
    let etf = ctx.sector_etf(&snap.symbol);

    match horizon {
        Horizon::Short => {
            let rs = snap.rs_rating_or_default();
            if rs > 90.0 {
                reasons.push(format!("RS {rs:.0}"));
            }
            if snap.ret_5d > 5.0 {
                reasons.push(format!("strong 5d momentum +{:.1}%", snap.ret_5d));
            } else if snap.ret_5d > 0.0 {
                reasons.push(format!("5d +{:.1}%", snap.ret_5d));
            }
            if snap.rvol > 2.0 {
                reasons.push(format!("volume surge {:.1}x", snap.rvol));
            } else if snap.rvol > 1.5 {
                reasons.push("volume rising".to_string());
            }
            if snap.has_news {
                reasons.push("news".to_string());
            }
            if snap.high52 > 0.0 && snap.price >= snap.high52 * 0.98 {
                reasons.push("new high".to_string());
            }
            if etf.is_some_and(|e| e.ret_5d > 2.0) {
                reasons.push("sector strong".to_string());
            }
        }
        Horizon::Mid => {
            if snap.ret_1mo > 10.0 {
                reasons.push(format!("1mo +{:.1}%", snap.ret_1mo));
            }
            if snap.is_squeeze {
                reasons.push("Bollinger squeeze".to_string());
            }
            if snap.golden_cross {
                reasons.push("golden cross".to_string());
            } else if snap.above_sma50 {
                reasons.push("above SMA50".to_string());
            }
            if snap.rvol > 1.5 {
                reasons.push("volume rising".to_string());
            }
            if etf.is_some_and(|e| e.ret_1mo > 5.0) {
                reasons.push("money flowing into sector".to_string());
            }
        }
        Horizon::Long => {
            if snap.ret_1y > 50.0 {
                reasons.push(format!("1y +{:.0}%", snap.ret_1y));
            }
            if snap.max_drawdown < 30.0 {
                reasons.push(format!("steady growth (max drawdown {:.0}%)", snap.max_drawdown));
            }
            let inst = snap.fundamentals.institutional_pct();
            if inst > 40.0 {
                reasons.push(format!("institutions hold {inst:.0}%"));
            }
            if snap.ret_1y > snap.ret_6mo && snap.ret_6mo > snap.ret_3mo && snap.ret_3mo > 0.0 {
                reasons.push("rising trend".to_string());
            }
            let short_ratio = snap.fundamentals.short_ratio();
            if (2.0..=5.0).contains(&short_ratio) {
                reasons.push(format!("short ratio {short_ratio:.1} (squeeze fuel)"));
            }
            if etf.is_some_and(|e| e.ret_ytd > 10.0) {
                reasons.push("sector strong YTD".to_string());
            }
        }
    }

    if reasons.is_empty() {
        return FALLBACK_REASON.to_string();
    }
    reasons.truncate(MAX_REASONS);
    reasons.join(" / ")
}
