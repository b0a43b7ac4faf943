//! Serializable analysis configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [analysis]
//! symbol = "SPY"
//! first_year = 1993
//!
//! [forecast]
//! horizon = 5
//! method = "exact"
//! max_iterations = 5000
//! tolerance = 1e-10
//! ```

use std::path::Path;

use barcast_core::forecast::{
    FitMethod, FitOptions, ForecastConfig, NelderMeadConfig, DEFAULT_HORIZON,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("year {year} outside supported range {first}..={last}")]
    YearOutOfRange { year: i32, first: i32, last: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub symbol: String,
    /// Earliest year a caller may request.
    pub first_year: i32,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            symbol: "SPY".into(),
            first_year: 1993,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSection {
    pub horizon: usize,
    pub method: FitMethod,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for ForecastSection {
    fn default() -> Self {
        let optimizer = NelderMeadConfig::default();
        Self {
            horizon: DEFAULT_HORIZON,
            method: FitMethod::Exact,
            max_iterations: optimizer.max_iterations,
            tolerance: optimizer.f_tolerance,
        }
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    pub forecast: ForecastSection,
}

impl AnalysisConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("analysis.symbol must not be empty".into()));
        }
        if self.forecast.horizon == 0 {
            return Err(ConfigError::Invalid("forecast.horizon must be at least 1".into()));
        }
        if self.forecast.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "forecast.max_iterations must be at least 1".into(),
            ));
        }
        if !(self.forecast.tolerance.is_finite() && self.forecast.tolerance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "forecast.tolerance must be positive, got {}",
                self.forecast.tolerance
            )));
        }
        Ok(())
    }

    /// Check a requested year against `[first_year, current_year]`.
    pub fn check_year(&self, year: i32, current_year: i32) -> Result<(), ConfigError> {
        let first = self.analysis.first_year;
        if year < first || year > current_year {
            return Err(ConfigError::YearOutOfRange {
                year,
                first,
                last: current_year,
            });
        }
        Ok(())
    }

    /// Forecast engine settings derived from the `[forecast]` section.
    pub fn forecast_config(&self) -> ForecastConfig {
        let optimizer = NelderMeadConfig {
            max_iterations: self.forecast.max_iterations,
            f_tolerance: self.forecast.tolerance,
            x_tolerance: self.forecast.tolerance,
            ..NelderMeadConfig::default()
        };
        ForecastConfig {
            horizon: self.forecast.horizon,
            fit: FitOptions {
                method: self.forecast.method,
                optimizer,
            },
        }
    }
}
