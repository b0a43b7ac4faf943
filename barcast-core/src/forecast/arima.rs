//! ARIMA(p,1,0) estimation and forecasting.
//!
//! The close series is differenced once and an AR(p) model without constant
//! is fitted to the differences. Estimation has two stages:
//!
//! 1. Conditional least squares: closed-form normal equations solved by
//!    Cholesky. Rank deficiency (constant or collinear differences) is a fit
//!    failure.
//! 2. Exact Gaussian likelihood (`FitMethod::Exact`, default): the first p
//!    observations are scored with their stationary covariance through the
//!    Durbin–Levinson recursion, the innovation variance is concentrated out,
//!    and the remaining coefficients are refined by Nelder–Mead from the
//!    stage-1 estimate.
//!
//! Non-stationary coefficient vectors are infeasible for stage 2.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::optimizer::{minimize, NelderMeadConfig};

/// Autoregressive lags.
pub const AR_ORDER: usize = 5;
/// Differencing order.
pub const DIFF_ORDER: usize = 1;
/// Moving-average lags.
pub const MA_ORDER: usize = 0;

/// Smallest eigenvalue of X'X relative to the largest below which the
/// regression is treated as singular.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    /// Conditional least squares only.
    Css,
    /// Conditional least squares start, exact likelihood refinement.
    Exact,
}

impl std::fmt::Display for FitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitMethod::Css => f.write_str("css"),
            FitMethod::Exact => f.write_str("exact"),
        }
    }
}

impl std::str::FromStr for FitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "css" => Ok(FitMethod::Css),
            "exact" | "mle" => Ok(FitMethod::Exact),
            other => Err(format!("unknown fit method '{other}' (expected css or exact)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub method: FitMethod,
    pub optimizer: NelderMeadConfig,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            method: FitMethod::Exact,
            optimizer: NelderMeadConfig::default(),
        }
    }
}

/// Numerical fit failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("need at least {needed} differenced observations, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("degenerate series: {0}")]
    Degenerate(String),

    #[error("singular design matrix (reciprocal condition {rcond:.3e})")]
    Singular { rcond: f64 },

    #[error("non-stationary autoregressive estimate {coefficients:?}")]
    NonStationary { coefficients: Vec<f64> },

    #[error("optimizer did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// A fitted ARIMA(p,1,0) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaFit {
    pub ar: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub method: FitMethod,
    pub iterations: usize,
    pub converged: bool,
    /// Number of differenced observations the model was fitted on.
    pub nobs: usize,
}

impl ArimaFit {
    /// Recursive multi-step forecast of price levels following `closes`.
    ///
    /// `closes` must be the series the model was fitted on (or one with the
    /// same tail); forecasts continue from its last value.
    pub fn forecast(&self, closes: &[f64], horizon: usize) -> Vec<f64> {
        let mut diffs = difference(closes);
        let Some(&last) = closes.last() else {
            return Vec::new();
        };
        let mut level = last;
        let mut out = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let next: f64 = self
                .ar
                .iter()
                .enumerate()
                .map(|(j, phi)| phi * diffs.iter().rev().nth(j).copied().unwrap_or(0.0))
                .sum();
            diffs.push(next);
            level += next;
            out.push(level);
        }
        out
    }
}

/// First differences.
pub fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Fit ARIMA(`AR_ORDER`,1,0) to a close series.
pub fn fit(closes: &[f64], options: &FitOptions) -> Result<ArimaFit, FitError> {
    fit_order(closes, AR_ORDER, options)
}

/// Fit ARIMA(p,1,0) for an explicit AR order.
pub fn fit_order(closes: &[f64], p: usize, options: &FitOptions) -> Result<ArimaFit, FitError> {
    let diffs = difference(closes);
    let needed = 2 * p + 2;
    if diffs.len() < needed {
        return Err(FitError::TooShort {
            needed,
            got: diffs.len(),
        });
    }
    if diffs.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite("input"));
    }

    let scale = closes.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    if diffs.iter().all(|d| d.abs() <= 1e-12 * scale) {
        return Err(FitError::Degenerate(
            "close prices are constant; first differences have zero variance".into(),
        ));
    }

    let css = conditional_least_squares(&diffs, p)?;
    let n = diffs.len() as f64;

    match options.method {
        FitMethod::Css => {
            if !is_stationary(&css) {
                return Err(FitError::NonStationary { coefficients: css });
            }
            let residuals = conditional_residuals(&diffs, &css);
            let m = residuals.len() as f64;
            let sigma2 = residuals.iter().map(|e| e * e).sum::<f64>() / m;
            let log_likelihood = -0.5 * m * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0);
            finish(css, sigma2, log_likelihood, options.method, 0, true, diffs.len())
        }
        FitMethod::Exact => {
            let start = stationary_start(&css);
            let objective = |phi: &[f64]| {
                exact_neg2_log_likelihood(&diffs, phi).unwrap_or(f64::INFINITY)
            };
            let minimum = minimize(objective, &start, &options.optimizer);
            if !minimum.converged {
                return Err(FitError::NotConverged {
                    iterations: minimum.iterations,
                });
            }
            let (ss, _) = exact_terms(&diffs, &minimum.point).ok_or_else(|| {
                FitError::NonStationary {
                    coefficients: minimum.point.clone(),
                }
            })?;
            let sigma2 = ss / n;
            finish(
                minimum.point,
                sigma2,
                -0.5 * minimum.value,
                options.method,
                minimum.iterations,
                minimum.converged,
                diffs.len(),
            )
        }
    }
}

fn finish(
    ar: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    method: FitMethod,
    iterations: usize,
    converged: bool,
    nobs: usize,
) -> Result<ArimaFit, FitError> {
    if ar.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite("coefficients"));
    }
    if !sigma2.is_finite() || sigma2 <= 0.0 {
        return Err(FitError::Degenerate(format!(
            "innovation variance {sigma2} is not positive"
        )));
    }
    if !log_likelihood.is_finite() {
        return Err(FitError::NonFinite("log-likelihood"));
    }
    // Parameters: p AR coefficients plus the innovation variance.
    let k = (ar.len() + 1) as f64;
    Ok(ArimaFit {
        aic: -2.0 * log_likelihood + 2.0 * k,
        ar,
        sigma2,
        log_likelihood,
        method,
        iterations,
        converged,
        nobs,
    })
}

/// Stage 1: regress y_t on y_{t-1..t-p} (no intercept).
fn conditional_least_squares(y: &[f64], p: usize) -> Result<Vec<f64>, FitError> {
    let rows = y.len() - p;
    let mut x_data = Vec::with_capacity(rows * p);
    for t in p..y.len() {
        for lag in 1..=p {
            x_data.push(y[t - lag]);
        }
    }
    let x = DMatrix::from_row_slice(rows, p, &x_data);
    let target = DVector::from_column_slice(&y[p..]);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &target;

    let eigenvalues = xtx.clone().symmetric_eigenvalues();
    let max_eig = eigenvalues.max();
    let min_eig = eigenvalues.min();
    let rcond = if max_eig > 0.0 { min_eig / max_eig } else { 0.0 };
    if !(rcond > MIN_RECIPROCAL_CONDITION) {
        return Err(FitError::Singular { rcond });
    }

    let chol = xtx.cholesky().ok_or(FitError::Singular { rcond })?;
    let beta = chol.solve(&xty);
    Ok(beta.iter().copied().collect())
}

fn conditional_residuals(y: &[f64], phi: &[f64]) -> Vec<f64> {
    let p = phi.len();
    (p..y.len())
        .map(|t| y[t] - phi.iter().enumerate().map(|(j, c)| c * y[t - 1 - j]).sum::<f64>())
        .collect()
}

/// Pull a non-stationary CSS estimate inside the stationary region.
fn stationary_start(css: &[f64]) -> Vec<f64> {
    let mut candidate = css.to_vec();
    for _ in 0..100 {
        if is_stationary(&candidate) {
            return candidate;
        }
        candidate.iter_mut().for_each(|c| *c *= 0.9);
    }
    vec![0.0; css.len()]
}

/// True when all roots of 1 - φ₁z - … - φₚzᵖ lie outside the unit circle.
///
/// Runs the Levinson recursion backwards: the model is stationary iff every
/// implied partial autocorrelation has magnitude below one.
pub fn is_stationary(phi: &[f64]) -> bool {
    let mut a = phi.to_vec();
    for k in (1..=a.len()).rev() {
        let r = a[k - 1];
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let denom = 1.0 - r * r;
        a = (0..k - 1)
            .map(|j| (a[j] + r * a[k - 2 - j]) / denom)
            .collect();
    }
    true
}

/// Autocovariances γ₀..γₚ of a stationary AR(p) with unit innovation variance.
fn autocovariances(phi: &[f64]) -> Option<Vec<f64>> {
    let p = phi.len();
    let mut a = DMatrix::<f64>::zeros(p + 1, p + 1);
    for k in 0..=p {
        a[(k, k)] += 1.0;
        for (j, coef) in phi.iter().enumerate() {
            let lag = (k as isize - (j as isize + 1)).unsigned_abs();
            a[(k, lag)] -= coef;
        }
    }
    let mut b = DVector::<f64>::zeros(p + 1);
    b[0] = 1.0;
    let gamma = a.lu().solve(&b)?;
    if !(gamma[0] > 0.0) {
        return None;
    }
    Some(gamma.iter().copied().collect())
}

/// Scaled sum of squared one-step errors and Σ ln vₜ for the exact likelihood.
///
/// Prediction-error variances vₜ are relative to the innovation variance.
fn exact_terms(y: &[f64], phi: &[f64]) -> Option<(f64, f64)> {
    if !is_stationary(phi) {
        return None;
    }
    let p = phi.len();
    let gamma = autocovariances(phi)?;

    let mut ss = 0.0;
    let mut log_det = 0.0;
    let mut v = gamma[0];
    let mut coeffs: Vec<f64> = Vec::with_capacity(p);

    for t in 0..p.min(y.len()) {
        let pred: f64 = coeffs.iter().enumerate().map(|(j, c)| c * y[t - 1 - j]).sum();
        let e = y[t] - pred;
        ss += e * e / v;
        log_det += v.ln();

        let k = t + 1;
        if k < p {
            let num = gamma[k]
                - coeffs
                    .iter()
                    .enumerate()
                    .map(|(j, c)| c * gamma[k - 1 - j])
                    .sum::<f64>();
            let reflection = num / v;
            let mut next: Vec<f64> = (0..coeffs.len())
                .map(|j| coeffs[j] - reflection * coeffs[coeffs.len() - 1 - j])
                .collect();
            next.push(reflection);
            coeffs = next;
            v *= 1.0 - reflection * reflection;
            if !(v > 0.0) {
                return None;
            }
        }
    }

    for t in p..y.len() {
        let pred: f64 = phi.iter().enumerate().map(|(j, c)| c * y[t - 1 - j]).sum();
        let e = y[t] - pred;
        ss += e * e;
    }

    Some((ss, log_det))
}

/// -2 × concentrated exact log-likelihood.
fn exact_neg2_log_likelihood(y: &[f64], phi: &[f64]) -> Option<f64> {
    let (ss, log_det) = exact_terms(y, phi)?;
    let n = y.len() as f64;
    if !(ss > 0.0) {
        return None;
    }
    let sigma2 = ss / n;
    Some(n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0) + log_det)
}
