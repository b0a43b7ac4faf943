//! File import for CSV and Parquet bar data.
//!
//! Accepts yfinance-style exports (`Date,Open,High,Low,Close,Adj Close,Volume`)
//! as well as lowercase column names. Null cells become missing fields on the
//! raw bars, so the cleaner sees exactly what the file contained.

use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

/// Provider backed by a single CSV or Parquet file holding one instrument.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn source(&self) -> DataSource {
        match self.path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => DataSource::ParquetImport,
            _ => DataSource::CsvImport,
        }
    }

    fn import_failed(&self, reason: impl std::fmt::Display) -> DataError {
        DataError::ImportFailed {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Read the whole file into a DataFrame.
    fn read_frame(&self) -> Result<DataFrame, DataError> {
        let lazy = match self.source() {
            DataSource::ParquetImport => {
                LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default())
            }
            _ => LazyCsvReader::new(&self.path)
                .with_has_header(true)
                .with_infer_schema_length(Some(1000))
                .finish(),
        }
        .map_err(|e| self.import_failed(e))?;

        lazy.collect().map_err(|e| self.import_failed(e))
    }
}

impl DataProvider for FileProvider {
    fn name(&self) -> &str {
        "file_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let df = self.read_frame()?;
        let bars: Vec<RawBar> = frame_to_raw_bars(&df)
            .map_err(|e| self.import_failed(e))?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        tracing::info!(
            symbol,
            path = %self.path.display(),
            rows = df.height(),
            in_range = bars.len(),
            "imported bars from file"
        );

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: self.source(),
        })
    }
}

/// Find a column by case-insensitive name.
fn find_column<'a>(df: &'a DataFrame, wanted: &str) -> Result<&'a Column, String> {
    let name = df
        .get_column_names()
        .into_iter()
        .find(|n| n.as_str().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| format!("missing column '{wanted}'"))?
        .clone();
    df.column(name.as_str()).map_err(|e| e.to_string())
}

fn float_values(df: &DataFrame, wanted: &str) -> Result<Vec<Option<f64>>, String> {
    let series = find_column(df, wanted)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| e.to_string())?;
    let values = series.f64().map_err(|e| e.to_string())?;
    Ok(values.into_iter().collect())
}

/// Convert a bar DataFrame into raw bars.
///
/// Rows whose date cannot be parsed are skipped: without a date there is no
/// bar to attach the other fields to.
pub fn frame_to_raw_bars(df: &DataFrame) -> Result<Vec<RawBar>, String> {
    let dates = find_column(df, "date")?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| e.to_string())?;
    let dates = dates.str().map_err(|e| e.to_string())?;

    let open = float_values(df, "open")?;
    let high = float_values(df, "high")?;
    let low = float_values(df, "low")?;
    let close = float_values(df, "close")?;

    let volume = find_column(df, "volume")?
        .as_materialized_series()
        .cast(&DataType::UInt64)
        .map_err(|e| e.to_string())?;
    let volume: Vec<Option<u64>> = volume
        .u64()
        .map_err(|e| e.to_string())?
        .into_iter()
        .collect();

    let mut bars = Vec::with_capacity(df.height());
    for (i, date) in dates.into_iter().enumerate() {
        let Some(date) = date.and_then(parse_date) else {
            tracing::warn!(row = i, "skipping row with unparseable date");
            continue;
        };
        bars.push(RawBar {
            date,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        });
    }
    Ok(bars)
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn frame_conversion_keeps_nulls_as_missing() {
        let df = df!(
            "Date" => &["2024-01-02", "2024-01-03", "2024-01-04"],
            "Open" => &[Some(100.0), None, Some(102.0)],
            "High" => &[Some(101.0), Some(102.0), Some(103.0)],
            "Low" => &[Some(99.0), Some(100.0), Some(101.0)],
            "Close" => &[Some(100.5), Some(101.5), None],
            "Volume" => &[Some(1_000u64), Some(1_100), Some(1_200)],
        )
        .unwrap();

        let bars = frame_to_raw_bars(&df).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, Some(100.0));
        assert_eq!(bars[1].open, None);
        assert_eq!(bars[2].close, None);
        assert_eq!(bars[2].volume, Some(1_200));
    }

    #[test]
    fn missing_column_is_reported() {
        let df = df!(
            "date" => &["2024-01-02"],
            "open" => &[1.0],
        )
        .unwrap();
        let err = frame_to_raw_bars(&df).unwrap_err();
        assert!(err.contains("missing column 'high'"));
    }

    #[test]
    fn parse_date_ignores_time_suffix() {
        assert_eq!(
            parse_date("2024-01-02 00:00:00"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(parse_date("garbage"), None);
    }

    #[test]
    fn csv_import_filters_to_range() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
        writeln!(file, "2023-12-29,99.0,100.0,98.0,99.5,99.5,900").unwrap();
        writeln!(file, "2024-01-02,100.0,101.0,99.0,100.5,100.5,1000").unwrap();
        writeln!(file, "2024-01-03,100.5,,99.5,101.0,101.0,1100").unwrap();
        file.flush().unwrap();

        let provider = FileProvider::new(file.path());
        let result = provider
            .fetch(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .unwrap();

        assert_eq!(result.source, DataSource::CsvImport);
        assert_eq!(result.bars.len(), 2);
        assert_eq!(result.bars[1].high, None);
    }

    #[test]
    fn unreadable_file_is_an_import_error() {
        let provider = FileProvider::new("/nonexistent/bars.csv");
        let err = provider
            .fetch(
                "SPY",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::ImportFailed { .. }));
    }
}
