//! Simple Moving Average (SMA).
//!
//! Trailing mean of close prices over a lookback window.
//! Lookback: period - 1 (first value at index period-1, absent before).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self { period }
    }

    /// Trailing mean over raw values.
    ///
    /// Uses a Neumaier-compensated running sum so rolling over long series does
    /// not drift away from the direct windowed mean.
    pub fn over(&self, values: &[f64]) -> Vec<Option<f64>> {
        let n = values.len();
        let mut result = vec![None; n];
        if n < self.period {
            return result;
        }

        let mut sum = CompensatedSum::default();
        for &v in &values[..self.period] {
            sum.add(v);
        }
        result[self.period - 1] = Some(sum.value() / self.period as f64);

        for i in self.period..n {
            sum.add(values[i]);
            sum.add(-values[i - self.period]);
            result[i] = Some(sum.value() / self.period as f64);
        }

        result
    }
}

impl Indicator for Sma {
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        self.over(&closes)
    }
}

#[derive(Debug, Default)]
struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}
