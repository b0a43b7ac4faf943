//! CleanSeries: validated, date-ordered bar sequence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::{Bar, Column};

/// Violations of the clean-series invariants.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("bar at index {index} ({date}) has a non-finite price")]
    NonFinite { index: usize, date: NaiveDate },

    #[error("bar at index {index} ({date}) does not follow {previous}")]
    NotIncreasing {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

/// Bars with every field present and finite, strictly increasing by date.
///
/// A `CleanSeries` is never empty when it comes out of the cleaner; an empty
/// input is reported as `CleanOutcome::Empty` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanSeries {
    bars: Vec<Bar>,
}

impl CleanSeries {
    /// Build a series from bars, checking the invariants.
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            let finite = [bar.open, bar.high, bar.low, bar.close]
                .iter()
                .all(|v| v.is_finite());
            if !finite {
                return Err(SeriesError::NonFinite {
                    index,
                    date: bar.date,
                });
            }
            if index > 0 && bars[index - 1].date >= bar.date {
                return Err(SeriesError::NotIncreasing {
                    index,
                    date: bar.date,
                    previous: bars[index - 1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    /// Caller guarantees the invariants (used by the cleaner, which enforces them row by row).
    pub(crate) fn from_checked(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.column(Column::Close)
    }

    /// All values of one numeric column in date order.
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.bars.iter().map(|b| b.value(column)).collect()
    }
}
