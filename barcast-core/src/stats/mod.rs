//! Descriptive statistics and the summary report.

pub mod describe;
pub mod summary;

pub use describe::{mean, percentile_sorted, sample_std, ColumnStats};
pub use summary::{summarize, SummaryReport, HEAD_ROWS};
