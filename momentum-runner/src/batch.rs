//! Batch screening over a configured universe.
//!
//! Per-instrument stages (fetch, frame, scan, snapshot) fan out over a private
//! rayon pool sized by `batch.workers`. A failure drops only that instrument.
//! The cross-instrument stages then run on the collected results:
//!
//! 1. regime from the volatility series and the index trend
//! 2. sector ETF performance
//! 3. RS ratings and universe ranges over stocks (ETFs excluded)
//! 4. horizon scores, top picks, opportunity alerts, ranked buy signals

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use momentum_core::alerts::{opportunity_alerts, OpportunityAlert};
use momentum_core::regime::{classify, RegimeState, TrendReading};
use momentum_core::risk::crash_risk;
use momentum_core::scoring::{
    assign_rs_ratings, score_all, top_picks, EtfPerformance, EtfPerformanceMap, HorizonPicks,
    ScoreResult, ScoringContext, UniverseStats,
};
use momentum_core::signals::{
    analyze, check_latest_divergence, rank_buy_candidates, scan_full, scan_latest, Analysis,
    LatestDivergence, RankedSignal, SignalEvent,
};
use momentum_core::snapshot::InstrumentSnapshot;
use momentum_core::universe::SectorMap;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ScanMode, ScreenerConfig};
use crate::data_loader::{dataset_hash, load_instrument, BarSource, LoadError, LoadedInstrument};

/// Bump when the report layout changes.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// An instrument omitted from the batch and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentFailure {
    pub symbol: String,
    pub error: String,
}

/// One instrument's score on every horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonScores {
    pub short: ScoreResult,
    pub mid: ScoreResult,
    pub long: ScoreResult,
}

impl From<[ScoreResult; 3]> for HorizonScores {
    fn from([short, mid, long]: [ScoreResult; 3]) -> Self {
        Self { short, mid, long }
    }
}

/// Everything one batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub schema_version: u32,
    /// Latest session across the scanned instruments.
    pub as_of: Option<NaiveDate>,
    pub source: String,
    pub mode: ScanMode,
    pub config_fingerprint: String,
    pub dataset_hash: String,
    pub regime: RegimeState,
    pub etf_performance: BTreeMap<String, EtfPerformance>,
    pub stats: UniverseStats,
    pub snapshots: Vec<InstrumentSnapshot>,
    pub scores: BTreeMap<String, HorizonScores>,
    pub picks: HorizonPicks,
    /// Buy events on each instrument's last session, best bull probability first.
    pub buy_signals: Vec<RankedSignal>,
    /// Sell events on each instrument's last session.
    pub sell_signals: Vec<SignalEvent>,
    pub alerts: Vec<OpportunityAlert>,
    pub divergences: Vec<LatestDivergence>,
    pub failures: Vec<InstrumentFailure>,
}

impl BatchReport {
    /// Snapshot for `symbol`, case-insensitive.
    pub fn snapshot(&self, symbol: &str) -> Option<&InstrumentSnapshot> {
        self.snapshots
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Rebuild the scoring context this report was scored with.
    pub fn with_context<R>(
        &self,
        sectors: &SectorMap,
        f: impl FnOnce(&ScoringContext<'_>) -> R,
    ) -> R {
        let etf_performance: EtfPerformanceMap = self
            .etf_performance
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let ctx = ScoringContext {
            sectors,
            etf_performance: &etf_performance,
            stats: &self.stats,
            regime: self.regime.level,
        };
        f(&ctx)
    }
}

/// Per-instrument output of the parallel stage.
struct Scanned {
    instrument: LoadedInstrument,
    snapshot: Option<InstrumentSnapshot>,
    today: Option<SignalEvent>,
    divergence: Option<LatestDivergence>,
}

fn scan_instrument(instrument: LoadedInstrument, config: &ScreenerConfig) -> Scanned {
    let rules = config.scanner.rules();
    let lookback = config.scanner.position_lookback;
    let symbol = instrument.symbol.as_str();
    let frame = &instrument.frame;

    let today = match config.batch.mode {
        ScanMode::Latest => scan_latest(symbol, frame, &rules, lookback).event,
        ScanMode::Full => {
            let last = frame.len().saturating_sub(1);
            scan_full(symbol, frame, &rules)
                .events
                .into_iter()
                .last()
                .filter(|e| e.bar_index == last)
        }
    };

    let divergence = (config.batch.verify_latest && config.batch.mode == ScanMode::Latest)
        .then(|| check_latest_divergence(symbol, frame, &rules, lookback))
        .flatten();
    if let Some(d) = &divergence {
        warn!(
            symbol,
            date = %d.date,
            full = ?d.full,
            latest = ?d.latest,
            "latest-day scan disagrees with full replay"
        );
    }

    let snapshot = InstrumentSnapshot::from_frame(symbol, frame, instrument.fundamentals);
    Scanned {
        snapshot,
        today,
        divergence,
        instrument,
    }
}

/// Load every symbol on a private pool; failures are logged and collected.
fn load_all(
    source: &dyn BarSource,
    symbols: &[(String, usize)],
    workers: usize,
) -> Result<(Vec<LoadedInstrument>, Vec<InstrumentFailure>), BatchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    let results: Vec<(String, Result<LoadedInstrument, LoadError>)> = pool.install(|| {
        symbols
            .par_iter()
            .map(|(symbol, min_history)| {
                (symbol.clone(), load_instrument(source, symbol, *min_history))
            })
            .collect()
    });

    let mut loaded = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(instrument) => loaded.push(instrument),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "instrument skipped");
                failures.push(InstrumentFailure {
                    symbol,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok((loaded, failures))
}

/// Regime from the volatility series' last close and the index trend.
pub fn regime_from_frames(
    volatility: Option<&LoadedInstrument>,
    index: Option<&LoadedInstrument>,
) -> RegimeState {
    let vix = volatility
        .and_then(|v| v.frame.last())
        .map(|row| row.close);
    let trend = index.and_then(|i| TrendReading::from_frame(&i.frame));
    classify(vix, trend)
}

/// Load only the regime inputs and classify.
pub fn current_regime(
    config: &ScreenerConfig,
    source: &dyn BarSource,
) -> Result<RegimeState, BatchError> {
    let symbols = vec![
        (config.regime.volatility_symbol.clone(), 1),
        (config.regime.index_symbol.clone(), 1),
    ];
    let (loaded, _) = load_all(source, &symbols, config.batch.workers.min(2))?;
    let find = |s: &str| loaded.iter().find(|i| i.symbol.eq_ignore_ascii_case(s));
    Ok(regime_from_frames(
        find(&config.regime.volatility_symbol),
        find(&config.regime.index_symbol),
    ))
}

/// Run the whole pipeline over the configured universe.
pub fn run_batch(
    config: &ScreenerConfig,
    source: &dyn BarSource,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    let sectors = config.sector_map()?;
    let fingerprint = config.fingerprint()?;

    let universe: HashSet<String> = sectors
        .all_members()
        .into_iter()
        .chain(sectors.etfs())
        .map(str::to_string)
        .collect();

    let requests: Vec<(String, usize)> = config
        .symbols()
        .into_iter()
        .map(|s| {
            let min = if universe.contains(&s) {
                config.batch.min_history
            } else {
                1
            };
            (s, min)
        })
        .collect();

    info!(
        symbols = requests.len(),
        workers = config.batch.workers,
        source = source.name(),
        mode = ?config.batch.mode,
        "batch started"
    );

    let (loaded, failures) = load_all(source, &requests, config.batch.workers)?;
    let hash = dataset_hash(&loaded);

    let find = |s: &str| loaded.iter().find(|i| i.symbol.eq_ignore_ascii_case(s));
    let regime = regime_from_frames(
        find(&config.regime.volatility_symbol),
        find(&config.regime.index_symbol),
    );
    info!(level = %regime.level, volatility = regime.volatility, "regime classified");

    let to_scan: Vec<LoadedInstrument> = loaded
        .into_iter()
        .filter(|i| universe.contains(&i.symbol))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.batch.workers)
        .build()?;
    let scanned: Vec<Scanned> = pool.install(|| {
        to_scan
            .into_par_iter()
            .map(|instrument| scan_instrument(instrument, config))
            .collect()
    });

    let etf_performance: EtfPerformanceMap = scanned
        .iter()
        .filter(|s| sectors.is_etf(&s.instrument.symbol))
        .filter_map(|s| {
            let snap = s.snapshot.as_ref()?;
            Some((snap.symbol.clone(), EtfPerformance::from_snapshot(snap)))
        })
        .collect();

    let mut snapshots: Vec<InstrumentSnapshot> =
        scanned.iter().filter_map(|s| s.snapshot.clone()).collect();
    let (mut stocks, etfs): (Vec<InstrumentSnapshot>, Vec<InstrumentSnapshot>) = snapshots
        .drain(..)
        .partition(|s| !sectors.is_etf(&s.symbol));
    assign_rs_ratings(&mut stocks);
    let stats = UniverseStats::from_snapshots(&stocks);

    let ctx = ScoringContext {
        sectors: &sectors,
        etf_performance: &etf_performance,
        stats: &stats,
        regime: regime.level,
    };

    snapshots = stocks;
    snapshots.extend(etfs);
    snapshots.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let scores: BTreeMap<String, HorizonScores> = snapshots
        .iter()
        .map(|snap| (snap.symbol.clone(), score_all(snap, &ctx).into()))
        .collect();
    let picks = top_picks(&snapshots, &ctx, config.batch.top_n);

    let stock_frames: Vec<(&str, &momentum_core::indicators::IndicatorFrame)> = scanned
        .iter()
        .filter(|s| !sectors.is_etf(&s.instrument.symbol))
        .map(|s| (s.instrument.symbol.as_str(), &s.instrument.frame))
        .collect();
    let alerts = opportunity_alerts(&stock_frames, config.alerts.period, config.alerts.top_n);

    let buy_signals = rank_buy_candidates(
        scanned
            .iter()
            .filter_map(|s| Some((&s.instrument.frame, s.today.clone()?))),
    );
    let sell_signals: Vec<SignalEvent> = scanned
        .iter()
        .filter_map(|s| s.today.clone())
        .filter(|e| e.signal_type.is_sell())
        .collect();
    let divergences: Vec<LatestDivergence> =
        scanned.iter().filter_map(|s| s.divergence.clone()).collect();

    let as_of = snapshots.iter().map(|s| s.date).max();

    info!(
        scanned = snapshots.len(),
        failed = failures.len(),
        buys = buy_signals.len(),
        sells = sell_signals.len(),
        alerts = alerts.len(),
        divergences = divergences.len(),
        "batch finished"
    );

    Ok(BatchReport {
        schema_version: REPORT_SCHEMA_VERSION,
        as_of,
        source: source.name().to_string(),
        mode: config.batch.mode,
        config_fingerprint: fingerprint,
        dataset_hash: hash,
        regime,
        etf_performance: etf_performance.into_iter().collect(),
        stats,
        snapshots,
        scores,
        picks,
        buy_signals,
        sell_signals,
        alerts,
        divergences,
        failures,
    })
}

/// Single-instrument deep dive: full replay, status, snapshot, crash risk.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentReport {
    pub analysis: Analysis,
    pub snapshot: Option<InstrumentSnapshot>,
    pub crash_risk: Option<u32>,
    pub sector: Option<String>,
}

pub fn analyze_symbol(
    config: &ScreenerConfig,
    source: &dyn BarSource,
    symbol: &str,
) -> Result<Option<InstrumentReport>, BatchError> {
    let sectors = config.sector_map()?;
    let instrument = load_instrument(source, &symbol.to_uppercase(), 1)?;
    let rules = config.scanner.rules();

    let Some(analysis) = analyze(&instrument.symbol, &instrument.frame, &rules) else {
        return Ok(None);
    };
    debug!(symbol = %instrument.symbol, status = ?analysis.status, "analysis complete");

    let snapshot =
        InstrumentSnapshot::from_frame(&instrument.symbol, &instrument.frame, instrument.fundamentals);
    Ok(Some(InstrumentReport {
        crash_risk: snapshot.as_ref().map(crash_risk),
        sector: sectors.sector_of(&instrument.symbol).map(str::to_string),
        analysis,
        snapshot,
    }))
}
