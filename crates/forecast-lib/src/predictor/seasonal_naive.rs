//! Seasonal-naive baseline
//!
//! The held-out window is predicted by the training series lagged one
//! season. The future horizon is the mean of the last season, repeated.

use super::{FittedModel, ForecastModel};
use crate::error::ForecastError;
use crate::series::UsageSeries;

const NAME: &str = "Seasonal Naive";

pub struct SeasonalNaive {
    period: usize,
}

impl SeasonalNaive {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl ForecastModel for SeasonalNaive {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&self, train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError> {
        if self.period == 0 || train.len() < self.period {
            return Err(ForecastError::model_fit(
                NAME,
                format!("need at least {} training days", self.period.max(1)),
            ));
        }

        let last_season = train.tail(self.period);
        Ok(Box::new(FittedNaive {
            history: train.values().to_vec(),
            period: self.period,
            level: last_season.iter().sum::<f64>() / last_season.len() as f64,
        }))
    }
}

struct FittedNaive {
    history: Vec<f64>,
    period: usize,
    level: f64,
}

impl FittedModel for FittedNaive {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        Ok(vec![self.level; horizon])
    }

    fn backtest(&self, test_days: usize) -> Result<Vec<f64>, ForecastError> {
        let n = self.history.len();
        if n < self.period + test_days {
            return Err(ForecastError::model_fit(
                NAME,
                format!(
                    "need {} training days to lag a {}-day test window",
                    self.period + test_days,
                    test_days
                ),
            ));
        }
        Ok(self.history[n - self.period - test_days..n - self.period].to_vec())
    }
}
