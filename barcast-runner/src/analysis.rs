//! Analysis orchestrator: wires cleaning, features, summary and forecast.
//!
//! Two entry points:
//! - `run_analysis()`: fetches the year from a provider, then runs. Used by the CLI.
//! - `run()`: takes raw bars already in hand. Used by tests and file imports.
//!
//! Local failures are typed values. An empty clean series is `NoData`; short
//! history and fit failures stay inside `ForecastResult`. Panics are caught at
//! this boundary and surfaced as `Unexpected`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barcast_core::data::{
    clean, CleanOutcome, CleanStats, DataError, DataProvider, DataSource, EmptyReason, RawBar,
};
use barcast_core::features::{derive_features, FeatureSeries};
use barcast_core::forecast::{forecast, ForecastConfig, ForecastResult};
use barcast_core::stats::{summarize, SummaryReport};

use crate::config::AnalysisConfig;
use crate::data_loader::{compute_dataset_hash, load_year, restrict_to_year, LoadedYear};

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that end an analysis without a result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{message}")]
    NoData { reason: EmptyReason, message: String },

    #[error("data provider error: {0}")]
    Provider(#[from] DataError),

    #[error("an unexpected error occurred: {detail}")]
    Unexpected { detail: String },
}

impl AnalysisError {
    fn no_data(reason: EmptyReason, symbol: &str, year: i32, stats: CleanStats) -> Self {
        let message = match reason {
            EmptyReason::NoRows => format!("no data found for {symbol} in {year}"),
            EmptyReason::AllDropped => format!(
                "no clean data available for {symbol} in {year} after removing {} invalid rows",
                stats.dropped_incomplete + stats.dropped_out_of_order
            ),
        };
        AnalysisError::NoData { reason, message }
    }
}

/// Complete result of one (symbol, year) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub year: i32,
    pub source: DataSource,
    pub features: FeatureSeries,
    pub summary: SummaryReport,
    pub forecast: ForecastResult,
    pub clean_stats: CleanStats,
    /// Provider bars dated outside the requested year.
    pub out_of_year: usize,
    /// BLAKE3 over the cleaned bars.
    pub dataset_hash: String,
    pub data_quality_warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl AnalysisResult {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Fetch `year` for `symbol` from `provider` and analyze it.
///
/// The caller validates `year` (see `AnalysisConfig::check_year`).
pub fn run_analysis(
    provider: &dyn DataProvider,
    symbol: &str,
    year: i32,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let forecast_config = config.forecast_config();
    guarded(|| {
        let loaded = load_year(provider, symbol, year)?;
        analyze(loaded, &forecast_config)
    })
}

/// Analyze raw bars already in hand. Bars outside `year` are discarded and counted.
pub fn run(
    symbol: &str,
    year: i32,
    raw: Vec<RawBar>,
    source: DataSource,
    config: &ForecastConfig,
) -> Result<AnalysisResult, AnalysisError> {
    guarded(|| {
        let (bars, out_of_year) = restrict_to_year(raw, year);
        analyze(
            LoadedYear {
                symbol: symbol.to_string(),
                year,
                source,
                bars,
                out_of_year,
            },
            config,
        )
    })
}

/// Run `f`, converting a panic into `AnalysisError::Unexpected`.
fn guarded<F>(f: F) -> Result<AnalysisResult, AnalysisError>
where
    F: FnOnce() -> Result<AnalysisResult, AnalysisError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            tracing::error!(%detail, "analysis panicked");
            Err(AnalysisError::Unexpected { detail })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn analyze(loaded: LoadedYear, config: &ForecastConfig) -> Result<AnalysisResult, AnalysisError> {
    let LoadedYear {
        symbol,
        year,
        source,
        bars,
        out_of_year,
    } = loaded;

    let outcome = clean(&bars);
    let clean_stats = outcome.stats();
    let series = match outcome {
        CleanOutcome::Clean { series, .. } => series,
        CleanOutcome::Empty { reason, stats } => {
            let err = AnalysisError::no_data(reason, &symbol, year, stats);
            tracing::warn!(symbol = %symbol, year, "{err}");
            return Err(err);
        }
    };

    let features = derive_features(&series);
    let (summary, forecast) = rayon::join(
        || summarize(&series).with_indicator_stats(&features),
        || forecast(&series, config),
    );

    let dataset_hash = compute_dataset_hash(&symbol, series.bars());
    let insane = series.bars().iter().filter(|b| !b.is_sane()).count();
    let data_quality_warnings = quality_warnings(&clean_stats, out_of_year, insane, source);

    tracing::info!(
        symbol = %symbol,
        year,
        rows = series.len(),
        forecast = forecast.is_available(),
        "analysis complete"
    );

    Ok(AnalysisResult {
        schema_version: SCHEMA_VERSION,
        symbol,
        year,
        source,
        features,
        summary,
        forecast,
        clean_stats,
        out_of_year,
        dataset_hash,
        data_quality_warnings,
    })
}

fn quality_warnings(
    stats: &CleanStats,
    out_of_year: usize,
    insane: usize,
    source: DataSource,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if stats.dropped_incomplete > 0 {
        warnings.push(format!(
            "{} of {} rows dropped for missing or non-finite values",
            stats.dropped_incomplete, stats.input_rows
        ));
    }
    if stats.dropped_out_of_order > 0 {
        warnings.push(format!(
            "{} rows dropped as duplicate or out-of-order dates",
            stats.dropped_out_of_order
        ));
    }
    if insane > 0 {
        warnings.push(format!(
            "{insane} bars have inconsistent OHLC prices (high below low, open or close)"
        ));
    }
    if out_of_year > 0 {
        warnings.push(format!("{out_of_year} rows outside the requested year ignored"));
    }
    if source == DataSource::Synthetic {
        warnings.push("synthetic data: not real market prices".to_string());
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_year(n: usize) -> Vec<RawBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.01;
                RawBar::complete(
                    start + chrono::Duration::days(i as i64),
                    close - 0.2,
                    close + 1.0,
                    close - 1.0,
                    close,
                    1_000,
                )
            })
            .collect()
    }

    #[test]
    fn empty_input_is_no_rows() {
        let err = run("SPY", 2023, vec![], DataSource::CsvImport, &ForecastConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::NoData {
                reason: EmptyReason::NoRows,
                ..
            }
        ));
        assert_eq!(err.to_string(), "no data found for SPY in 2023");
    }

    #[test]
    fn all_incomplete_is_all_dropped() {
        let mut raw = raw_year(3);
        for bar in &mut raw {
            bar.close = None;
        }
        let err = run("SPY", 2023, raw, DataSource::CsvImport, &ForecastConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::NoData {
                reason: EmptyReason::AllDropped,
                ..
            }
        ));
    }

    #[test]
    fn only_out_of_year_rows_is_no_rows() {
        let err = run("SPY", 2021, raw_year(10), DataSource::CsvImport, &ForecastConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::NoData {
                reason: EmptyReason::NoRows,
                ..
            }
        ));
    }

    #[test]
    fn warnings_describe_dropped_rows() {
        let mut raw = raw_year(30);
        raw[3].volume = None;
        let result = run("SPY", 2023, raw, DataSource::CsvImport, &ForecastConfig::default())
            .unwrap();
        assert_eq!(result.clean_stats.dropped_incomplete, 1);
        assert_eq!(result.features.len(), 29);
        assert_eq!(result.data_quality_warnings.len(), 1);
    }

    #[test]
    fn inconsistent_ohlc_is_kept_and_flagged() {
        let mut raw = raw_year(30);
        raw[5].high = Some(raw[5].low.unwrap() - 1.0);
        raw[9].open = Some(raw[9].high.unwrap() + 2.0);
        let result = run("SPY", 2023, raw, DataSource::CsvImport, &ForecastConfig::default())
            .unwrap();
        assert_eq!(result.features.len(), 30);
        assert_eq!(
            result.data_quality_warnings,
            vec!["2 bars have inconsistent OHLC prices (high below low, open or close)"]
        );
    }

    #[test]
    fn provider_errors_pass_through() {
        struct Failing;
        impl DataProvider for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            fn fetch(
                &self,
                symbol: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<barcast_core::data::FetchResult, DataError> {
                Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
        }

        let err = run_analysis(&Failing, "NOPE", 2023, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Provider(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn provider_panic_becomes_unexpected() {
        struct Panicking;
        impl DataProvider for Panicking {
            fn name(&self) -> &str {
                "panicking"
            }
            fn fetch(
                &self,
                _symbol: &str,
                _start: NaiveDate,
                _end: NaiveDate,
            ) -> Result<barcast_core::data::FetchResult, DataError> {
                panic!("connector exploded")
            }
        }

        let err = run_analysis(&Panicking, "SPY", 2023, &AnalysisConfig::default()).unwrap_err();
        match err {
            AnalysisError::Unexpected { detail } => assert!(detail.contains("connector exploded")),
            other => panic!("expected Unexpected, got {other:?}"),
        }
    }
}
