//! Row-wise cleaning of raw provider bars.
//!
//! Policy: a bar with any missing or non-finite field is dropped whole (no
//! imputation). Surviving bars keep their input order. A bar whose date does
//! not strictly follow the previously kept bar is dropped too, so the output
//! always satisfies the `CleanSeries` ordering invariant.

use serde::{Deserialize, Serialize};

use super::provider::RawBar;
use crate::domain::{Bar, CleanSeries};

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    pub input_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_out_of_order: usize,
}

impl CleanStats {
    pub fn kept(&self) -> usize {
        self.input_rows - self.dropped_incomplete - self.dropped_out_of_order
    }
}

/// Why cleaning produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The provider returned no rows at all.
    NoRows,
    /// Rows existed but none survived cleaning.
    AllDropped,
}

/// Result of cleaning: a non-empty series, or an explicit empty signal.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanOutcome {
    Clean { series: CleanSeries, stats: CleanStats },
    Empty { reason: EmptyReason, stats: CleanStats },
}

impl CleanOutcome {
    pub fn stats(&self) -> CleanStats {
        match self {
            CleanOutcome::Clean { stats, .. } | CleanOutcome::Empty { stats, .. } => *stats,
        }
    }

    pub fn series(&self) -> Option<&CleanSeries> {
        match self {
            CleanOutcome::Clean { series, .. } => Some(series),
            CleanOutcome::Empty { .. } => None,
        }
    }
}

/// Clean raw bars into a `CleanSeries`.
pub fn clean(raw: &[RawBar]) -> CleanOutcome {
    let mut stats = CleanStats {
        input_rows: raw.len(),
        ..CleanStats::default()
    };

    if raw.is_empty() {
        return CleanOutcome::Empty {
            reason: EmptyReason::NoRows,
            stats,
        };
    }

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
    for row in raw {
        let Some(bar) = row.to_bar() else {
            stats.dropped_incomplete += 1;
            continue;
        };
        if bars.last().is_some_and(|prev| prev.date >= bar.date) {
            stats.dropped_out_of_order += 1;
            continue;
        }
        bars.push(bar);
    }

    if stats.dropped_incomplete > 0 {
        tracing::debug!(
            dropped = stats.dropped_incomplete,
            input = stats.input_rows,
            "dropped bars with missing fields"
        );
    }
    if stats.dropped_out_of_order > 0 {
        tracing::warn!(
            dropped = stats.dropped_out_of_order,
            "dropped duplicate or out-of-order bars"
        );
    }

    if bars.is_empty() {
        return CleanOutcome::Empty {
            reason: EmptyReason::AllDropped,
            stats,
        };
    }

    CleanOutcome::Clean {
        series: CleanSeries::from_checked(bars),
        stats,
    }
}
