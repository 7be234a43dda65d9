//! Bar sources and per-instrument loading.
//!
//! `BarSource` is the seam to whatever fetches prices upstream. Two sources
//! ship here:
//! - `CsvDirSource`: one `<SYMBOL>.csv` per instrument plus an optional
//!   `fundamentals.csv`
//! - `SyntheticSource`: deterministic random walks seeded from the symbol name
//!
//! Retries and rate limiting belong to the source; the loader neither retries
//! nor caches.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use momentum_core::domain::{Bar, BarError};
use momentum_core::indicators::IndicatorFrame;
use momentum_core::snapshot::Fundamentals;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// File inside a CSV directory holding per-symbol fundamentals.
pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

/// Errors raised by a bar source for one symbol.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data for '{symbol}' at {}", path.display())]
    NotFound { symbol: String, path: PathBuf },

    #[error("read '{symbol}': {source}")]
    Io {
        symbol: String,
        source: std::io::Error,
    },

    #[error("parse '{symbol}': {source}")]
    Csv { symbol: String, source: csv::Error },
}

/// Errors from turning fetched bars into a ready instrument.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid bars for '{symbol}': {source}")]
    Bars { symbol: String, source: BarError },

    #[error("'{symbol}' has {bars} bars, need at least {required}")]
    TooShort {
        symbol: String,
        bars: usize,
        required: usize,
    },
}

/// Where bars and fundamentals come from.
pub trait BarSource: Send + Sync {
    fn name(&self) -> &str;

    /// Daily bars ascending by date.
    fn fetch(&self, symbol: &str) -> Result<Vec<Bar>, FetchError>;

    /// Fundamentals; any missing field falls back to its neutral default downstream.
    fn fundamentals(&self, _symbol: &str) -> Fundamentals {
        Fundamentals::default()
    }
}

// ─── CSV directory ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl CsvBar {
    /// None for rows with a missing or non-finite price.
    fn into_bar(self) -> Option<Bar> {
        let bar = Bar {
            date: self.date,
            open: self.open?,
            high: self.high?,
            low: self.low?,
            close: self.close?,
            volume: self.volume.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0) as u64,
        };
        (!bar.is_void()).then_some(bar)
    }
}

#[derive(Debug, Deserialize)]
struct CsvFundamentals {
    symbol: String,
    beta: Option<f64>,
    short_ratio: Option<f64>,
    institutional_ownership: Option<f64>,
}

/// Reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume` header.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
    fundamentals: HashMap<String, Fundamentals>,
}

impl CsvDirSource {
    /// Open a directory, loading `fundamentals.csv` when present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let dir = dir.into();
        let fundamentals_path = dir.join(FUNDAMENTALS_FILE);
        let fundamentals = if fundamentals_path.exists() {
            read_fundamentals(&fundamentals_path)?
        } else {
            HashMap::new()
        };
        Ok(Self { dir, fundamentals })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

/// `NaN` and `inf` parse as floats; treat them as missing.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn read_fundamentals(path: &Path) -> Result<HashMap<String, Fundamentals>, FetchError> {
    let csv_err = |source| FetchError::Csv {
        symbol: FUNDAMENTALS_FILE.to_string(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut table = HashMap::new();
    for row in reader.deserialize::<CsvFundamentals>() {
        let row = row.map_err(csv_err)?;
        table.insert(
            row.symbol.trim().to_uppercase(),
            Fundamentals {
                beta: finite(row.beta),
                short_ratio: finite(row.short_ratio),
                institutional_ownership: finite(row.institutional_ownership),
            },
        );
    }
    Ok(table)
}

impl BarSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<Bar>, FetchError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(FetchError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        let file = std::fs::File::open(&path).map_err(|source| FetchError::Io {
            symbol: symbol.to_string(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut bars = Vec::new();
        let mut dropped = 0usize;
        for row in reader.deserialize::<CsvBar>() {
            let row = row.map_err(|source| FetchError::Csv {
                symbol: symbol.to_string(),
                source,
            })?;
            match row.into_bar() {
                Some(bar) => bars.push(bar),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(symbol, dropped, "dropped void rows");
        }
        Ok(bars)
    }

    fn fundamentals(&self, symbol: &str) -> Fundamentals {
        self.fundamentals
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or_default()
    }
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random-walk bars, weekdays only.
///
/// The same symbol always yields the same series. Symbols starting with `^`
/// are treated as index levels and start near 20 instead of 100.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub start: NaiveDate,
    pub sessions: usize,
}

impl SyntheticSource {
    pub fn new(start: NaiveDate, sessions: usize) -> Self {
        Self { start, sessions }
    }
}

impl BarSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<Bar>, FetchError> {
        Ok(synthetic_bars(symbol, self.start, self.sessions))
    }
}

/// Generate `sessions` weekday bars starting at `start`.
pub fn synthetic_bars(symbol: &str, start: NaiveDate, sessions: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(sessions);
    let mut price = if symbol.starts_with('^') { 20.0 } else { 100.0_f64 };
    let mut current = start;

    while bars.len() < sessions {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

// ─── Loading ────────────────────────────────────────────────────────

/// An instrument ready for the per-instrument stages.
#[derive(Debug, Clone)]
pub struct LoadedInstrument {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub frame: IndicatorFrame,
    pub fundamentals: Fundamentals,
}

/// Fetch, validate, and derive the indicator frame for one symbol.
pub fn load_instrument(
    source: &dyn BarSource,
    symbol: &str,
    min_history: usize,
) -> Result<LoadedInstrument, LoadError> {
    let bars = source.fetch(symbol)?;
    if bars.len() < min_history {
        return Err(LoadError::TooShort {
            symbol: symbol.to_string(),
            bars: bars.len(),
            required: min_history,
        });
    }
    let frame = IndicatorFrame::build(&bars).map_err(|source| LoadError::Bars {
        symbol: symbol.to_string(),
        source,
    })?;
    Ok(LoadedInstrument {
        symbol: symbol.to_string(),
        fundamentals: source.fundamentals(symbol),
        bars,
        frame,
    })
}

/// BLAKE3 over every instrument's bars, independent of load order.
pub fn dataset_hash<'a>(instruments: impl IntoIterator<Item = &'a LoadedInstrument>) -> String {
    let mut sorted: Vec<&LoadedInstrument> = instruments.into_iter().collect();
    sorted.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut hasher = blake3::Hasher::new();
    for instrument in sorted {
        hasher.update(instrument.symbol.as_bytes());
        for bar in &instrument.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let a = synthetic_bars("AAPL", start(), 120);
        let b = synthetic_bars("AAPL", start(), 120);
        let c = synthetic_bars("MSFT", start(), 120);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 120);
    }

    #[test]
    fn synthetic_skips_weekends_and_is_sane() {
        let bars = synthetic_bars("SPY", start(), 60);
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.is_sane(), "{bar:?}");
        }
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn index_levels_start_low() {
        let bars = synthetic_bars("^VIX", start(), 1);
        assert!((bars[0].open - 20.0).abs() < 1e-12);
    }

    #[test]
    fn csv_source_reads_bars_and_drops_void_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ABC.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-02,10,11,9,10.5,1000\n\
             2024-01-03,,,,,\n\
             2024-01-04,10.5,12,10,11.5,1500\n",
        )
        .unwrap();

        let source = CsvDirSource::open(dir.path()).unwrap();
        let bars = source.fetch("abc").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 11.5);
        assert_eq!(bars[1].volume, 1500);
        assert_eq!(source.fundamentals("ABC"), Fundamentals::default());
    }

    #[test]
    fn csv_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDirSource::open(dir.path()).unwrap();
        let err = source.fetch("NOPE").unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[test]
    fn csv_source_reads_fundamentals_with_gaps() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(FUNDAMENTALS_FILE),
            "symbol,beta,short_ratio,institutional_ownership\n\
             nvda,1.7,,0.65\n",
        )
        .unwrap();
        let source = CsvDirSource::open(dir.path()).unwrap();
        let f = source.fundamentals("NVDA");
        assert_eq!(f.beta, Some(1.7));
        assert_eq!(f.short_ratio, None);
        assert_eq!(f.short_ratio(), 0.0);
        assert!((f.institutional_pct() - 65.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_fundamentals_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(FUNDAMENTALS_FILE),
            "symbol,beta,short_ratio,institutional_ownership\n\
             AMD,NaN,inf,-inf\n",
        )
        .unwrap();
        let source = CsvDirSource::open(dir.path()).unwrap();
        let f = source.fundamentals("AMD");
        assert_eq!(f.beta, None);
        assert_eq!(f.short_ratio, None);
        assert_eq!(f.institutional_ownership, None);
        assert_eq!(f.beta(), 1.0);
        assert_eq!(f.short_ratio(), 0.0);
        assert_eq!(f.institutional_pct(), 0.0);
    }

    #[test]
    fn load_rejects_short_history() {
        let source = SyntheticSource::new(start(), 30);
        let err = load_instrument(&source, "ABC", 55).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TooShort {
                bars: 30,
                required: 55,
                ..
            }
        ));
    }

    #[test]
    fn dataset_hash_ignores_load_order() {
        let source = SyntheticSource::new(start(), 80);
        let a = load_instrument(&source, "AAA", 55).unwrap();
        let b = load_instrument(&source, "BBB", 55).unwrap();
        assert_eq!(
            dataset_hash([&a, &b]),
            dataset_hash([&b, &a])
        );
        assert_ne!(dataset_hash([&a]), dataset_hash([&a, &b]));
    }
}
