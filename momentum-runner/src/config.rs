//! Screener configuration loaded from TOML.
//!
//! ```toml
//! [batch]
//! workers = 4
//! mode = "latest"
//!
//! [[sectors]]
//! name = "Semiconductors"
//! etf = "SMH"
//! members = ["NVDA", "AMD"]
//! ```

use std::path::{Path, PathBuf};

use momentum_core::alerts::{ReturnPeriod, DEFAULT_ALERT_TOP_N};
use momentum_core::signals::{ScanRules, MAX_OPEN_BUYS};
use momentum_core::universe::{Sector, SectorMap, UniverseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on concurrent fetches; upstream sources rate-limit aggressively.
pub const MAX_WORKERS: usize = 9;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("batch.workers must be between 1 and {MAX_WORKERS}, got {0}")]
    Workers(usize),
    #[error("batch.top_n must be at least 1")]
    TopN,
    #[error("scanner.max_open_buys must be between 1 and {MAX_OPEN_BUYS}, got {0}")]
    OpenBuys(u32),
    #[error("scanner.{0} must be at least 1")]
    Cooldown(&'static str),
    #[error("invalid sector table: {0}")]
    Universe(#[from] UniverseError),
    #[error("fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Full replay of every instrument's history, or the latest session only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Latest,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub workers: usize,
    pub mode: ScanMode,
    pub top_n: usize,
    /// Replay full history alongside the latest-day scan and log disagreements.
    pub verify_latest: bool,
    /// Instruments with fewer bars are skipped.
    pub min_history: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            mode: ScanMode::Latest,
            top_n: 3,
            verify_latest: false,
            min_history: 55,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeSettings {
    pub index_symbol: String,
    pub volatility_symbol: String,
}

impl Default for RegimeSettings {
    fn default() -> Self {
        Self {
            index_symbol: "SPY".into(),
            volatility_symbol: "^VIX".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    pub buy_cooldown: u32,
    pub sell_cooldown: u32,
    pub max_open_buys: u32,
    /// Sessions searched when reconstructing open buys for the latest-day scan.
    pub position_lookback: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        let rules = ScanRules::default();
        Self {
            buy_cooldown: rules.buy_cooldown,
            sell_cooldown: rules.sell_cooldown,
            max_open_buys: rules.max_open_buys,
            position_lookback: 60,
        }
    }
}

impl ScannerSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_OPEN_BUYS).contains(&self.max_open_buys) {
            return Err(ConfigError::OpenBuys(self.max_open_buys));
        }
        if self.buy_cooldown == 0 {
            return Err(ConfigError::Cooldown("buy_cooldown"));
        }
        if self.sell_cooldown == 0 {
            return Err(ConfigError::Cooldown("sell_cooldown"));
        }
        Ok(())
    }

    pub fn rules(&self) -> ScanRules {
        ScanRules {
            buy_cooldown: self.buy_cooldown,
            sell_cooldown: self.sell_cooldown,
            max_open_buys: self.max_open_buys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub period: ReturnPeriod,
    pub top_n: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            period: ReturnPeriod::default(),
            top_n: DEFAULT_ALERT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub batch: BatchSettings,
    pub regime: RegimeSettings,
    pub scanner: ScannerSettings,
    pub alerts: AlertSettings,
    pub sectors: Vec<Sector>,
}

impl ScreenerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.batch.workers) {
            return Err(ConfigError::Workers(self.batch.workers));
        }
        if self.batch.top_n == 0 {
            return Err(ConfigError::TopN);
        }
        self.scanner.validate()?;
        self.sector_map()?;
        Ok(())
    }

    pub fn sector_map(&self) -> Result<SectorMap, ConfigError> {
        Ok(SectorMap::new(self.sectors.clone())?)
    }

    /// Every symbol a batch needs: sector members, sector ETFs, then the
    /// regime index and volatility series. Upper-cased, first occurrence kept.
    pub fn symbols(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let members = self.sectors.iter().flat_map(|s| s.members.iter());
        let etfs = self.sectors.iter().filter_map(|s| s.etf.as_ref());
        members
            .chain(etfs)
            .chain([&self.regime.index_symbol, &self.regime.volatility_symbol])
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect()
    }

    /// BLAKE3 of the canonical JSON form; recorded in every batch report.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"
[batch]
workers = 2
mode = "full"
verify_latest = true

[regime]
index_symbol = "QQQ"

[scanner]
buy_cooldown = 3

[alerts]
period = "1mo"

[[sectors]]
name = "Semiconductors"
etf = "SMH"
members = ["NVDA", "amd"]

[[sectors]]
name = "Energy"
members = ["XOM"]
"#;

    #[test]
    fn parses_with_defaults() {
        let config = ScreenerConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.batch.workers, 2);
        assert_eq!(config.batch.mode, ScanMode::Full);
        assert_eq!(config.batch.top_n, 3);
        assert_eq!(config.batch.min_history, 55);
        assert!(config.batch.verify_latest);
        assert_eq!(config.regime.index_symbol, "QQQ");
        assert_eq!(config.regime.volatility_symbol, "^VIX");
        assert_eq!(config.scanner.rules().buy_cooldown, 3);
        assert_eq!(config.scanner.rules().sell_cooldown, 5);
        assert_eq!(config.scanner.position_lookback, 60);
        assert_eq!(config.alerts.period, ReturnPeriod::OneMonth);
        assert_eq!(config.alerts.top_n, 10);
    }

    #[test]
    fn empty_config_is_valid() {
        let config = ScreenerConfig::from_toml("").unwrap();
        assert_eq!(config, ScreenerConfig::default());
        assert_eq!(config.symbols(), vec!["SPY", "^VIX"]);
    }

    #[test]
    fn symbols_cover_members_etfs_and_regime() {
        let config = ScreenerConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(
            config.symbols(),
            vec!["NVDA", "AMD", "XOM", "SMH", "QQQ", "^VIX"]
        );
    }

    #[test]
    fn rejects_oversized_pool() {
        let err = ScreenerConfig::from_toml("[batch]\nworkers = 16\n").unwrap_err();
        assert!(matches!(err, ConfigError::Workers(16)));
        let err = ScreenerConfig::from_toml("[batch]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Workers(0)));
    }

    #[test]
    fn rejects_open_buy_cap_outside_range() {
        let err = ScreenerConfig::from_toml("[scanner]\nmax_open_buys = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::OpenBuys(5)));
        let err = ScreenerConfig::from_toml("[scanner]\nmax_open_buys = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::OpenBuys(0)));
        let config = ScreenerConfig::from_toml("[scanner]\nmax_open_buys = 1\n").unwrap();
        assert_eq!(config.scanner.rules().max_open_buys, 1);
    }

    #[test]
    fn rejects_zero_cooldowns() {
        let err = ScreenerConfig::from_toml("[scanner]\nbuy_cooldown = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Cooldown("buy_cooldown")));
        let err = ScreenerConfig::from_toml("[scanner]\nsell_cooldown = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Cooldown("sell_cooldown")));
        assert_eq!(err.to_string(), "scanner.sell_cooldown must be at least 1");
    }

    #[test]
    fn rejects_ticker_in_two_sectors() {
        let toml = r#"
[[sectors]]
name = "A"
members = ["X"]
[[sectors]]
name = "B"
members = ["x"]
"#;
        let err = ScreenerConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Universe(_)));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = ScreenerConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.batch.top_n = 5;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    proptest! {
        #[test]
        fn worker_bound_is_enforced(workers in 0usize..32) {
            let toml = format!("[batch]\nworkers = {workers}\n");
            let ok = ScreenerConfig::from_toml(&toml).is_ok();
            prop_assert_eq!(ok, (1..=MAX_WORKERS).contains(&workers));
        }

        #[test]
        fn open_buy_cap_is_enforced(cap in 0u32..8) {
            let toml = format!("[scanner]\nmax_open_buys = {cap}\n");
            let ok = ScreenerConfig::from_toml(&toml).is_ok();
            prop_assert_eq!(ok, (1..=MAX_OPEN_BUYS).contains(&cap));
        }

        #[test]
        fn symbols_are_upper_case_and_unique(
            members in prop::collection::vec("[a-zA-Z]{1,5}", 0..12),
        ) {
            let config = ScreenerConfig {
                sectors: vec![Sector { name: "S".into(), etf: None, members }],
                ..ScreenerConfig::default()
            };
            let symbols = config.symbols();
            let unique: std::collections::HashSet<&String> = symbols.iter().collect();
            prop_assert_eq!(unique.len(), symbols.len());
            prop_assert!(symbols.iter().all(|s| *s == s.to_uppercase()));
        }
    }
}
