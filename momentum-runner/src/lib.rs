//! Momentum Runner: batch screening over a configured universe.
//!
//! This crate builds on `momentum-core` to provide:
//! - TOML configuration with a BLAKE3 fingerprint
//! - Bar sources (CSV directory, deterministic synthetic walks)
//! - A bounded worker pool with per-instrument failure isolation
//! - Cross-instrument stages: regime, ETF performance, RS ratings, picks, alerts
//! - JSON and CSV report export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;

pub use batch::{
    analyze_symbol, current_regime, regime_from_frames, run_batch, BatchError, BatchReport,
    HorizonScores, InstrumentFailure, InstrumentReport,
};
pub use config::{ConfigError, ScanMode, ScreenerConfig};
pub use data_loader::{
    dataset_hash, load_instrument, synthetic_bars, BarSource, CsvDirSource, FetchError,
    LoadError, LoadedInstrument, SyntheticSource,
};
