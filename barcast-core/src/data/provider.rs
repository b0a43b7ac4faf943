//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV/Parquet
//! import, synthetic) so the analysis pipeline never knows where bars came from.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Raw daily OHLCV bar from a data provider (before cleaning).
///
/// Any field may be missing; the cleaner drops such bars whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

impl RawBar {
    /// Raw bar with every field present.
    pub fn complete(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Convert to a clean `Bar` if every field is present and every price is finite.
    pub fn to_bar(&self) -> Option<Bar> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(Bar {
            date: self.date,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            volume: self.volume?,
        })
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output as-is.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("import failed for {path}: {reason}")]
    ImportFailed { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    ParquetImport,
    Synthetic,
}

/// Trait for data providers.
///
/// Implementations may return an empty bar list for a valid symbol and range;
/// the pipeline reports that as "no data" rather than a provider error.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn complete_raw_bar_converts() {
        let raw = RawBar::complete(date(), 10.0, 11.0, 9.0, 10.5, 500);
        let bar = raw.to_bar().unwrap();
        assert_eq!(bar.close, 10.5);
        assert_eq!(bar.volume, 500);
    }

    #[test]
    fn missing_field_blocks_conversion() {
        let mut raw = RawBar::complete(date(), 10.0, 11.0, 9.0, 10.5, 500);
        raw.volume = None;
        assert!(raw.to_bar().is_none());

        let mut raw = RawBar::complete(date(), 10.0, 11.0, 9.0, 10.5, 500);
        raw.low = None;
        assert!(raw.to_bar().is_none());
    }

    #[test]
    fn non_finite_price_counts_as_missing() {
        let raw = RawBar::complete(date(), 10.0, f64::INFINITY, 9.0, 10.5, 500);
        assert!(raw.to_bar().is_none());
        let raw = RawBar::complete(date(), f64::NAN, 11.0, 9.0, 10.5, 500);
        assert!(raw.to_bar().is_none());
    }
}
