//! Barcast Core: domain types, data providers, cleaning, features, statistics, forecasting.
//!
//! This crate holds the pure analytics pipeline stages:
//! - Domain types (bars, clean series)
//! - Data connectors (Yahoo, CSV/Parquet import, synthetic) and the cleaner
//! - Trailing moving-average features
//! - Descriptive summary statistics
//! - ARIMA(5,1,0) close forecasts on business-day dates
//!
//! Orchestration, configuration and rendering live in `barcast-runner`.

pub mod data;
pub mod domain;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod stats;
