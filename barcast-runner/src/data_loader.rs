//! Bar loading for a single (symbol, year) request.
//!
//! Fetches the calendar year from a provider and keeps the provenance the
//! result carries: data source and the number of bars the provider returned
//! outside the requested year. The dataset hash is computed later over the
//! cleaned bars, so it identifies exactly what the analysis saw.

use barcast_core::data::{DataError, DataProvider, DataSource, RawBar};
use barcast_core::domain::Bar;
use chrono::{Datelike, NaiveDate};

/// Raw bars for one calendar year plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedYear {
    pub symbol: String,
    pub year: i32,
    pub source: DataSource,
    /// Bars inside the requested year, provider order preserved.
    pub bars: Vec<RawBar>,
    /// Bars the provider returned outside the year (discarded).
    pub out_of_year: usize,
}

/// Inclusive date range for a calendar year.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Keep bars dated inside `year`; return them with the discarded count.
pub fn restrict_to_year(raw: Vec<RawBar>, year: i32) -> (Vec<RawBar>, usize) {
    let total = raw.len();
    let kept: Vec<RawBar> = raw.into_iter().filter(|b| b.date.year() == year).collect();
    let discarded = total - kept.len();
    (kept, discarded)
}

/// Fetch one calendar year of bars for `symbol`.
pub fn load_year(
    provider: &dyn DataProvider,
    symbol: &str,
    year: i32,
) -> Result<LoadedYear, DataError> {
    let (start, end) =
        year_bounds(year).ok_or_else(|| DataError::Other(format!("invalid year {year}")))?;

    tracing::debug!(provider = provider.name(), symbol, year, "fetching bars");
    let fetched = provider.fetch(symbol, start, end)?;
    let (bars, out_of_year) = restrict_to_year(fetched.bars, year);

    if out_of_year > 0 {
        tracing::debug!(out_of_year, year, "discarded bars outside requested year");
    }

    Ok(LoadedYear {
        symbol: fetched.symbol,
        year,
        source: fetched.source,
        bars,
        out_of_year,
    })
}

/// Deterministic BLAKE3 hash over the cleaned bars.
///
/// Covers the symbol, then date and OHLCV of every bar in order.
pub fn compute_dataset_hash(symbol: &str, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use barcast_core::data::SyntheticProvider;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn restrict_counts_out_of_year_bars() {
        let raw = vec![
            RawBar::complete(d(2022, 12, 30), 1.0, 1.0, 1.0, 1.0, 1),
            RawBar::complete(d(2023, 1, 3), 1.0, 1.0, 1.0, 1.0, 1),
            RawBar::complete(d(2023, 6, 1), 1.0, 1.0, 1.0, 1.0, 1),
            RawBar::complete(d(2024, 1, 2), 1.0, 1.0, 1.0, 1.0, 1),
        ];
        let (kept, discarded) = restrict_to_year(raw, 2023);
        assert_eq!(kept.len(), 2);
        assert_eq!(discarded, 2);
    }

    #[test]
    fn load_year_uses_calendar_bounds() {
        let loaded = load_year(&SyntheticProvider::new(), "SPY", 2024).unwrap();
        assert_eq!(loaded.source, DataSource::Synthetic);
        assert_eq!(loaded.out_of_year, 0);
        assert_eq!(loaded.bars.first().unwrap().date, d(2024, 1, 1));
        assert_eq!(loaded.bars.last().unwrap().date, d(2024, 12, 31));
    }

    #[test]
    fn dataset_hash_is_deterministic_and_content_sensitive() {
        let bars: Vec<Bar> = (0..3)
            .map(|i| Bar {
                date: d(2024, 1, 2 + i),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.5,
                volume: 100,
            })
            .collect();
        let a = compute_dataset_hash("SPY", &bars);
        assert_eq!(a, compute_dataset_hash("SPY", &bars));
        assert_eq!(a.len(), 64);

        let mut changed = bars.clone();
        changed[1].close = 10.6;
        assert_ne!(a, compute_dataset_hash("SPY", &changed));
        assert_ne!(a, compute_dataset_hash("QQQ", &bars));
    }
}
