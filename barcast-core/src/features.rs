//! Moving-average feature derivation over a clean series.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, CleanSeries};
use crate::indicators::{Indicator, Sma};

/// Short moving-average window (bars).
pub const MA_SHORT_WINDOW: usize = 20;
/// Long moving-average window (bars).
pub const MA_LONG_WINDOW: usize = 50;

/// One clean bar with its derived moving averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(flatten)]
    pub bar: Bar,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
}

/// Clean series extended with MA20 and MA50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSeries {
    rows: Vec<FeatureRow>,
}

impl FeatureSeries {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ma20(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.ma20).collect()
    }

    pub fn ma50(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.ma50).collect()
    }
}

/// Derive MA20 and MA50 for every bar of the series.
pub fn derive_features(series: &CleanSeries) -> FeatureSeries {
    let bars = series.bars();
    let ma20 = Sma::new(MA_SHORT_WINDOW).compute(bars);
    let ma50 = Sma::new(MA_LONG_WINDOW).compute(bars);

    let rows = bars
        .iter()
        .zip(ma20)
        .zip(ma50)
        .map(|((bar, ma20), ma50)| FeatureRow {
            bar: bar.clone(),
            ma20,
            ma50,
        })
        .collect();

    FeatureSeries { rows }
}
