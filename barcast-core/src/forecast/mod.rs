//! Short-horizon close forecasts from an ARIMA(5,1,0) fit.
//!
//! `forecast` never fails: too-short input and numerical fit failures are
//! reported as `ForecastResult::Unavailable` inside an otherwise valid result.

pub mod arima;
pub mod calendar;
pub mod optimizer;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::CleanSeries;

pub use arima::{fit, ArimaFit, FitError, FitMethod, FitOptions, AR_ORDER, DIFF_ORDER, MA_ORDER};
pub use calendar::{is_business_day, next_business_days};
pub use optimizer::{minimize, Minimum, NelderMeadConfig};

/// Default number of forecast steps.
pub const DEFAULT_HORIZON: usize = 5;

/// A series must have strictly more closes than this to be forecast.
pub const MIN_HISTORY: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub fit: FitOptions,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            fit: FitOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

/// Fitted-model details attached to a successful forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnostics {
    /// (p, d, q)
    pub order: (usize, usize, usize),
    pub ar_coefficients: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub method: FitMethod,
    pub iterations: usize,
    pub converged: bool,
    pub observations: usize,
}

impl From<&ArimaFit> for ModelDiagnostics {
    fn from(fit: &ArimaFit) -> Self {
        Self {
            order: (fit.ar.len(), DIFF_ORDER, MA_ORDER),
            ar_coefficients: fit.ar.clone(),
            sigma2: fit.sigma2,
            log_likelihood: fit.log_likelihood,
            aic: fit.aic,
            method: fit.method,
            iterations: fit.iterations,
            converged: fit.converged,
            observations: fit.nobs,
        }
    }
}

/// Why no forecast was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableReason {
    InsufficientData { observations: usize, required: usize },
    FitFailed { detail: String },
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::InsufficientData {
                observations,
                required,
            } => write!(
                f,
                "insufficient history: {observations} bars, need more than {}",
                required - 1
            ),
            UnavailableReason::FitFailed { detail } => write!(f, "model fit failed: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastResult {
    Available {
        points: Vec<ForecastPoint>,
        horizon: usize,
        diagnostics: ModelDiagnostics,
    },
    Unavailable {
        reason: UnavailableReason,
    },
}

impl ForecastResult {
    pub fn points(&self) -> &[ForecastPoint] {
        match self {
            ForecastResult::Available { points, .. } => points,
            ForecastResult::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ForecastResult::Available { .. })
    }

    pub fn unavailable_reason(&self) -> Option<&UnavailableReason> {
        match self {
            ForecastResult::Available { .. } => None,
            ForecastResult::Unavailable { reason } => Some(reason),
        }
    }

    pub fn diagnostics(&self) -> Option<&ModelDiagnostics> {
        match self {
            ForecastResult::Available { diagnostics, .. } => Some(diagnostics),
            ForecastResult::Unavailable { .. } => None,
        }
    }

    fn fit_failed(detail: impl Into<String>) -> Self {
        ForecastResult::Unavailable {
            reason: UnavailableReason::FitFailed {
                detail: detail.into(),
            },
        }
    }
}

/// Forecast the next `config.horizon` business-day closes.
pub fn forecast(series: &CleanSeries, config: &ForecastConfig) -> ForecastResult {
    let closes = series.closes();
    if closes.len() <= MIN_HISTORY {
        tracing::debug!(
            observations = closes.len(),
            "skipping forecast: not enough history"
        );
        return ForecastResult::Unavailable {
            reason: UnavailableReason::InsufficientData {
                observations: closes.len(),
                required: MIN_HISTORY + 1,
            },
        };
    }

    let model = match fit(&closes, &config.fit) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!(error = %e, method = %config.fit.method, "ARIMA fit failed");
            return ForecastResult::fit_failed(e.to_string());
        }
    };

    let values = model.forecast(&closes, config.horizon);
    if values.iter().any(|v| !v.is_finite()) {
        tracing::warn!("ARIMA forecast produced non-finite values");
        return ForecastResult::fit_failed(FitError::NonFinite("forecast").to_string());
    }

    let Some(last_date) = series.last_date() else {
        return ForecastResult::fit_failed("series has no dates");
    };
    let dates = next_business_days(last_date, config.horizon);

    let points: Vec<ForecastPoint> = dates
        .into_iter()
        .zip(values)
        .map(|(date, predicted_close)| ForecastPoint {
            date,
            predicted_close,
        })
        .collect();

    tracing::debug!(
        horizon = config.horizon,
        aic = model.aic,
        iterations = model.iterations,
        "forecast complete"
    );

    ForecastResult::Available {
        horizon: points.len(),
        points,
        diagnostics: ModelDiagnostics::from(&model),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use chrono::Datelike;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn wavy_closes(n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut level = 100.0;
        (0..n)
            .map(|i| {
                level += 0.3 * (i as f64 * 0.37).sin() + rng.gen_range(-1.0..1.0);
                level
            })
            .collect()
    }

    fn series_of(closes: &[f64]) -> CleanSeries {
        CleanSeries::new(make_bars(closes)).unwrap()
    }

    #[test]
    fn sixty_bars_is_insufficient() {
        let result = forecast(&series_of(&wavy_closes(60)), &ForecastConfig::default());
        assert_eq!(
            result.unavailable_reason(),
            Some(&UnavailableReason::InsufficientData {
                observations: 60,
                required: 61
            })
        );
    }

    #[test]
    fn sixty_one_bars_forecasts() {
        let result = forecast(&series_of(&wavy_closes(61)), &ForecastConfig::default());
        assert!(result.is_available(), "{result:?}");
        assert_eq!(result.points().len(), DEFAULT_HORIZON);
    }

    #[test]
    fn forecast_dates_are_following_business_days() {
        let series = series_of(&wavy_closes(120));
        let result = forecast(&series, &ForecastConfig::default());
        let last = series.last_date().unwrap();
        let points = result.points();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].date, next_business_days(last, 1)[0]);
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        for p in points {
            assert!(p.date.weekday().num_days_from_monday() < 5);
            assert!(p.predicted_close.is_finite());
        }
    }

    #[test]
    fn constant_closes_fail_the_fit() {
        let result = forecast(&series_of(&[42.0; 200]), &ForecastConfig::default());
        assert!(matches!(
            result.unavailable_reason(),
            Some(UnavailableReason::FitFailed { .. })
        ));
    }

    #[test]
    fn css_method_produces_diagnostics() {
        let config = ForecastConfig {
            horizon: 3,
            fit: FitOptions {
                method: FitMethod::Css,
                ..FitOptions::default()
            },
        };
        let result = forecast(&series_of(&wavy_closes(150)), &config);
        let diag = result.diagnostics().unwrap();
        assert_eq!(diag.order, (5, 1, 0));
        assert_eq!(diag.method, FitMethod::Css);
        assert_eq!(result.points().len(), 3);
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let result = forecast(&series_of(&wavy_closes(10)), &ForecastConfig::default());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"]["kind"], "insufficient_data");
    }
}
