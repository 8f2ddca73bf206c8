//! Evaluator configuration

use crate::error::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

/// Days forecast beyond the end of the training data
pub const DEFAULT_FORECAST_DAYS: usize = 90;

/// Held-out suffix used to score each model variant
pub const DEFAULT_TEST_DAYS: usize = 30;

/// Minimum training history on top of the test window
pub const DEFAULT_MIN_TRAIN_DAYS: usize = 60;

/// Weekly seasonality
pub const DEFAULT_SEASON_PERIOD: usize = 7;

/// Environment variable prefix, e.g. `CAPCAST_FORECAST_DAYS`
pub const ENV_PREFIX: &str = "CAPCAST";

/// Forecaster configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Forecast horizon in days
    #[serde(default = "default_forecast_days")]
    pub forecast_days: usize,

    /// Length of the held-out test window in days
    #[serde(default = "default_test_days")]
    pub test_days: usize,

    /// Records required beyond the test window
    #[serde(default = "default_min_train_days")]
    pub min_train_days: usize,

    /// Seasonal period in days
    #[serde(default = "default_season_period")]
    pub season_period: usize,

    /// First day of the usage history window (inclusive)
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,

    /// Last day of the usage history window (inclusive)
    #[serde(default = "default_history_end")]
    pub history_end: NaiveDate,
}

fn default_forecast_days() -> usize {
    DEFAULT_FORECAST_DAYS
}

fn default_test_days() -> usize {
    DEFAULT_TEST_DAYS
}

fn default_min_train_days() -> usize {
    DEFAULT_MIN_TRAIN_DAYS
}

fn default_season_period() -> usize {
    DEFAULT_SEASON_PERIOD
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 22).unwrap_or(NaiveDate::MIN)
}

fn default_history_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 21).unwrap_or(NaiveDate::MIN)
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            forecast_days: default_forecast_days(),
            test_days: default_test_days(),
            min_train_days: default_min_train_days(),
            season_period: default_season_period(),
            history_start: default_history_start(),
            history_end: default_history_end(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from an optional file, then `CAPCAST_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let config: Self = builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forecast_days == 0 {
            return Err(ConfigError::Zero { field: "forecast_days" });
        }
        if self.test_days == 0 {
            return Err(ConfigError::Zero { field: "test_days" });
        }
        if self.season_period == 0 {
            return Err(ConfigError::Zero { field: "season_period" });
        }
        if self.history_start > self.history_end {
            return Err(ConfigError::InvertedWindow {
                start: self.history_start,
                end: self.history_end,
            });
        }

        let required = self
            .season_period
            .checked_mul(2)
            .and_then(|seasons| seasons.checked_add(self.test_days))
            .ok_or(ConfigError::Overflow { field: "season_period" })?;
        if self.min_train_days < required {
            return Err(ConfigError::TrainingTooShort {
                min_train_days: self.min_train_days,
                required,
            });
        }
        if self.test_days.checked_add(self.min_train_days).is_none() {
            return Err(ConfigError::Overflow { field: "min_train_days" });
        }
        Ok(())
    }

    /// Records a VM needs before any model is fitted
    pub fn required_records(&self) -> usize {
        self.test_days.saturating_add(self.min_train_days)
    }
}
