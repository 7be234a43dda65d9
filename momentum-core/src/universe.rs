//! Sector configuration: instrument → sector → sector ETF.
//!
//! A constructed value passed to scoring and picks; never ambient state. Tickers
//! are normalised to upper case.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniverseError {
    #[error("sector name must not be empty")]
    EmptySectorName,
    #[error("sector {0:?} is defined more than once")]
    DuplicateSector(String),
    #[error("ticker {ticker} is listed in both {first:?} and {second:?}")]
    TickerInTwoSectors {
        ticker: String,
        first: String,
        second: String,
    },
}

/// One sector: its members and the ETF tracking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    #[serde(default)]
    pub etf: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Validated ticker/sector/ETF lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectorMap {
    sectors: Vec<Sector>,
    #[serde(skip)]
    ticker_to_sector: HashMap<String, usize>,
    #[serde(skip)]
    sector_index: BTreeMap<String, usize>,
}

impl SectorMap {
    pub fn new(sectors: Vec<Sector>) -> Result<Self, UniverseError> {
        let mut map = Self::default();
        for mut sector in sectors {
            if sector.name.trim().is_empty() {
                return Err(UniverseError::EmptySectorName);
            }
            if map.sector_index.contains_key(&sector.name) {
                return Err(UniverseError::DuplicateSector(sector.name));
            }
            let idx = map.sectors.len();
            sector.etf = sector.etf.map(|e| e.trim().to_uppercase());
            sector.members = sector
                .members
                .iter()
                .map(|m| m.trim().to_uppercase())
                .collect();
            for ticker in &sector.members {
                if let Some(&other) = map.ticker_to_sector.get(ticker) {
                    if other != idx {
                        return Err(UniverseError::TickerInTwoSectors {
                            ticker: ticker.clone(),
                            first: map.sectors[other].name.clone(),
                            second: sector.name.clone(),
                        });
                    }
                }
                map.ticker_to_sector.insert(ticker.clone(), idx);
            }
            map.sector_index.insert(sector.name.clone(), idx);
            map.sectors.push(sector);
        }
        Ok(map)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.ticker_to_sector
            .get(&ticker.to_uppercase())
            .map(|&i| self.sectors[i].name.as_str())
    }

    pub fn etf_of_sector(&self, sector: &str) -> Option<&str> {
        self.sector_index
            .get(sector)
            .and_then(|&i| self.sectors[i].etf.as_deref())
    }

    /// The ETF of the sector `ticker` belongs to.
    pub fn etf_for(&self, ticker: &str) -> Option<&str> {
        self.sector_of(ticker).and_then(|s| self.etf_of_sector(s))
    }

    /// Members of a sector, empty for an unknown sector.
    pub fn members(&self, sector: &str) -> &[String] {
        self.sector_index
            .get(sector)
            .map(|&i| self.sectors[i].members.as_slice())
            .unwrap_or(&[])
    }

    /// Every distinct sector ETF, sorted.
    pub fn etfs(&self) -> Vec<&str> {
        let mut etfs: Vec<&str> = self.sectors.iter().filter_map(|s| s.etf.as_deref()).collect();
        etfs.sort_unstable();
        etfs.dedup();
        etfs
    }

    /// True when `ticker` is one of the sector ETFs (excluded from stock picks).
    pub fn is_etf(&self, ticker: &str) -> bool {
        let ticker = ticker.to_uppercase();
        self.sectors
            .iter()
            .any(|s| s.etf.as_deref() == Some(ticker.as_str()))
    }

    /// Every member ticker, in configuration order.
    pub fn all_members(&self) -> Vec<&str> {
        self.sectors
            .iter()
            .flat_map(|s| s.members.iter().map(String::as_str))
            .collect()
    }
}
