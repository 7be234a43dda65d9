//! Momentum Core: indicators, signal scanner, crash risk, regime, horizon scoring.
//!
//! This crate contains the analytical heart of the screener:
//! - Domain types (bars, series validation)
//! - Indicator pipeline producing a column-oriented frame
//! - Stateful buy/sell signal scan with cooldowns and a latest-day fast path
//! - Instrument snapshots, crash risk and market regime
//! - Three horizon scorers with an auditable contribution breakdown
//! - Top picks, sector alternatives and opportunity alerts

pub mod alerts;
pub mod domain;
pub mod indicators;
pub mod regime;
pub mod risk;
pub mod scoring;
pub mod signals;
pub mod snapshot;
pub mod universe;
