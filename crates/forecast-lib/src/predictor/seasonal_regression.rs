//! Additive trend + weekly seasonality regression
//!
//! Fits a linear trend and one seasonal offset per phase of the period (day of
//! week for a 7-day period) jointly by least squares. Offsets are centred so
//! the trend carries the level. There is no intra-day component since the
//! series is daily.

use super::{FittedModel, ForecastModel};
use crate::error::ForecastError;
use crate::series::UsageSeries;

const NAME: &str = "Seasonal Regression";

pub struct SeasonalRegression {
    period: usize,
}

impl SeasonalRegression {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl ForecastModel for SeasonalRegression {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&self, train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError> {
        let values = train.values();
        if self.period == 0 || values.len() < 2 * self.period {
            return Err(ForecastError::model_fit(
                NAME,
                format!("need at least {} training days", 2 * self.period.max(1)),
            ));
        }

        let (intercept, slope, offsets) = fit_within_phase(values, self.period);

        Ok(Box::new(FittedRegression {
            intercept,
            slope,
            offsets,
            origin: values.len(),
        }))
    }
}

struct FittedRegression {
    intercept: f64,
    slope: f64,
    offsets: Vec<f64>,
    /// Index of the first day after training
    origin: usize,
}

impl FittedModel for FittedRegression {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        Ok((self.origin..self.origin + horizon)
            .map(|i| self.intercept + self.slope * i as f64 + self.offsets[i % self.offsets.len()])
            .collect())
    }
}

/// Joint least-squares fit of `values[i] = intercept + slope * i + offsets[i % period]`
///
/// With one dummy per phase, the slope is the pooled within-phase regression
/// slope and each phase level is its mean net of the trend.
fn fit_within_phase(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
    let mut x_sum = vec![0.0; period];
    let mut y_sum = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, y) in values.iter().enumerate() {
        x_sum[i % period] += i as f64;
        y_sum[i % period] += y;
        counts[i % period] += 1;
    }
    let x_mean: Vec<f64> = x_sum.iter().zip(&counts).map(|(s, c)| s / *c as f64).collect();
    let y_mean: Vec<f64> = y_sum.iter().zip(&counts).map(|(s, c)| s / *c as f64).collect();

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean[i % period];
        sxy += dx * (y - y_mean[i % period]);
        sxx += dx * dx;
    }
    let slope = if sxx.abs() < f64::EPSILON { 0.0 } else { sxy / sxx };

    let levels: Vec<f64> = y_mean
        .iter()
        .zip(&x_mean)
        .map(|(y, x)| y - slope * x)
        .collect();
    let intercept = levels.iter().sum::<f64>() / period as f64;
    let offsets = levels.iter().map(|level| level - intercept).collect();

    (intercept, slope, offsets)
}
