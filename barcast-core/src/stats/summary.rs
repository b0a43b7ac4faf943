//! Summary report for a clean series: head rows, counts, per-column stats.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::describe::ColumnStats;
use crate::domain::{Bar, CleanSeries, Column};
use crate::features::FeatureSeries;

/// Number of leading rows shown in a report.
pub const HEAD_ROWS: usize = 5;

/// Descriptive summary of a clean series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub head_rows: Vec<Bar>,
    pub row_count: usize,
    pub column_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// One entry per OHLCV column, in `Column::ALL` order.
    pub column_stats: Vec<(Column, ColumnStats)>,
    /// Moving-average columns, described over their present values only.
    #[serde(default)]
    pub indicator_stats: Vec<(String, ColumnStats)>,
}

impl SummaryReport {
    pub fn stats_for(&self, column: Column) -> Option<&ColumnStats> {
        self.column_stats
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, s)| s)
    }

    /// Add describe-style stats for the moving-average columns.
    ///
    /// Columns with no present values (series shorter than the window) are omitted.
    pub fn with_indicator_stats(mut self, features: &FeatureSeries) -> Self {
        let columns = [("ma20", features.ma20()), ("ma50", features.ma50())];
        self.indicator_stats = columns
            .into_iter()
            .filter_map(|(name, values)| {
                let present: Vec<f64> = values.into_iter().flatten().collect();
                ColumnStats::from_values(&present).map(|s| (name.to_string(), s))
            })
            .collect();
        self
    }
}

/// Summarize a clean series.
pub fn summarize(series: &CleanSeries) -> SummaryReport {
    let column_stats = Column::ALL
        .iter()
        .filter_map(|&column| {
            ColumnStats::from_values(&series.column(column)).map(|stats| (column, stats))
        })
        .collect();

    SummaryReport {
        head_rows: series.bars().iter().take(HEAD_ROWS).cloned().collect(),
        row_count: series.len(),
        column_count: Column::ALL.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        column_stats,
        indicator_stats: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_features;
    use crate::indicators::make_bars;

    fn series(n: usize) -> CleanSeries {
        let closes: Vec<f64> = (0..n).map(|i| 50.0 + i as f64 * 0.5).collect();
        CleanSeries::new(make_bars(&closes)).unwrap()
    }

    #[test]
    fn head_rows_are_capped_at_five() {
        assert_eq!(summarize(&series(3)).head_rows.len(), 3);
        assert_eq!(summarize(&series(30)).head_rows.len(), 5);
    }

    #[test]
    fn counts_reflect_clean_series() {
        let report = summarize(&series(42));
        assert_eq!(report.row_count, 42);
        assert_eq!(report.column_count, 5);
        assert_eq!(report.column_stats.len(), 5);
        for (_, stats) in &report.column_stats {
            assert_eq!(stats.count, 42);
        }
    }

    #[test]
    fn close_stats_are_correct() {
        let report = summarize(&series(5));
        let close = report.stats_for(Column::Close).unwrap();
        assert_eq!(close.min, 50.0);
        assert_eq!(close.max, 52.0);
        assert_eq!(close.mean, 51.0);
        assert_eq!(close.p50, 51.0);
    }

    #[test]
    fn indicator_stats_count_present_values() {
        let s = series(60);
        let report = summarize(&s).with_indicator_stats(&derive_features(&s));
        let names: Vec<&str> = report.indicator_stats.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["ma20", "ma50"]);
        assert_eq!(report.indicator_stats[0].1.count, 41);
        assert_eq!(report.indicator_stats[1].1.count, 11);
    }

    #[test]
    fn summarize_is_pure() {
        let s = series(12);
        assert_eq!(summarize(&s), summarize(&s));
    }
}
