//! Seasonal ARIMA (1,1,1)x(1,1,1,s)
//!
//! The training series is differenced once at lag 1 and once at the seasonal
//! lag, giving `w`. The multiplicative ARMA model
//!
//! ```text
//! (1 - φB)(1 - ΦB^s) w_t = (1 + θB)(1 + ΘB^s) e_t
//! ```
//!
//! is fitted by conditional sum of squares: pre-sample values and residuals
//! are zero and the search runs over the stationary/invertible box with a
//! Nelder–Mead simplex. Forecasts set future residuals to zero and undo both
//! differences.

use super::{FittedModel, ForecastModel};
use crate::error::ForecastError;
use crate::series::UsageSeries;
use tracing::debug;

const NAME: &str = "SARIMA";

/// Coefficients are kept strictly inside (-BOUND, BOUND)
const BOUND: f64 = 0.98;

const MAX_ITERATIONS: usize = 400;
const TOLERANCE: f64 = 1e-10;

pub struct Sarima {
    period: usize,
}

impl Sarima {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl ForecastModel for Sarima {
    fn name(&self) -> &'static str {
        NAME
    }

    fn fit(&self, train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError> {
        let s = self.period;
        let y = train.values();
        let min_len = 3 * s.max(1) + 2;
        if s == 0 || y.len() < min_len {
            return Err(ForecastError::model_fit(
                NAME,
                format!("need at least {} training days", min_len),
            ));
        }

        let d1: Vec<f64> = y.windows(2).map(|p| p[1] - p[0]).collect();
        let w: Vec<f64> = (s..d1.len()).map(|t| d1[t] - d1[t - s]).collect();

        // Scale the objective so the simplex tolerance is unit free
        let scale = w.iter().map(|v| v * v).sum::<f64>().max(f64::MIN_POSITIVE);
        let objective = |u: &[f64]| {
            let coef = Coefficients::from_unbounded(u);
            let css = coef.residuals(&w, s).iter().skip(s + 1).map(|e| e * e).sum::<f64>();
            if css.is_finite() {
                css / scale
            } else {
                f64::INFINITY
            }
        };

        let (best, value) = nelder_mead(objective, &[0.0; 4], 0.5);
        if !value.is_finite() {
            return Err(ForecastError::model_fit(NAME, "conditional sum of squares diverged"));
        }

        let coef = Coefficients::from_unbounded(&best);
        debug!(
            phi = coef.phi,
            theta = coef.theta,
            seasonal_phi = coef.seasonal_phi,
            seasonal_theta = coef.seasonal_theta,
            "SARIMA coefficients estimated"
        );

        let residuals = coef.residuals(&w, s);
        Ok(Box::new(FittedSarima {
            coef,
            period: s,
            y: y.to_vec(),
            d1,
            w,
            residuals,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
struct Coefficients {
    phi: f64,
    theta: f64,
    seasonal_phi: f64,
    seasonal_theta: f64,
}

impl Coefficients {
    fn from_unbounded(u: &[f64]) -> Self {
        Self {
            phi: BOUND * u[0].tanh(),
            theta: BOUND * u[1].tanh(),
            seasonal_phi: BOUND * u[2].tanh(),
            seasonal_theta: BOUND * u[3].tanh(),
        }
    }

    /// One-step prediction of `w[t]` from earlier values and residuals
    fn predict(&self, w: &[f64], e: &[f64], t: usize, s: usize) -> f64 {
        let at = |series: &[f64], lag: usize| if t >= lag { series[t - lag] } else { 0.0 };

        let ar = self.phi * at(w, 1) + self.seasonal_phi * at(w, s)
            - self.phi * self.seasonal_phi * at(w, s + 1);
        let ma = self.theta * at(e, 1)
            + self.seasonal_theta * at(e, s)
            + self.theta * self.seasonal_theta * at(e, s + 1);
        ar + ma
    }

    fn residuals(&self, w: &[f64], s: usize) -> Vec<f64> {
        let mut e = Vec::with_capacity(w.len());
        for t in 0..w.len() {
            let predicted = self.predict(w, &e, t, s);
            e.push(w[t] - predicted);
        }
        e
    }
}

struct FittedSarima {
    coef: Coefficients,
    period: usize,
    y: Vec<f64>,
    d1: Vec<f64>,
    w: Vec<f64>,
    residuals: Vec<f64>,
}

impl FittedModel for FittedSarima {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let s = self.period;
        let mut w = self.w.clone();
        let mut e = self.residuals.clone();
        let mut d1 = self.d1.clone();
        let mut last = self.y.last().copied().unwrap_or_default();

        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = w.len();
            let next_w = self.coef.predict(&w, &e, t, s);
            w.push(next_w);
            e.push(0.0);

            let next_d1 = next_w + d1[d1.len() - s];
            d1.push(next_d1);
            last += next_d1;
            out.push(last);
        }
        Ok(out)
    }
}

/// Minimise `f` with the Nelder–Mead simplex method, returning the best
/// point and its value.
fn nelder_mead<F>(f: F, start: &[f64], step: f64) -> (Vec<f64>, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.to_vec(), f(start)));
    for i in 0..n {
        let mut point = start.to_vec();
        point[i] += step;
        let value = f(&point);
        simplex.push((point, value));
    }

    for _ in 0..MAX_ITERATIONS {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        if (worst - best).abs() <= TOLERANCE * (1.0 + best.abs()) {
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(p, _)| p[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n].0)
                .map(|(c, w)| c + coef * (w - c))
                .collect()
        };

        let reflected = along(-1.0);
        let reflected_value = f(&reflected);

        if reflected_value < simplex[0].1 {
            let expanded = along(-2.0);
            let expanded_value = f(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
        } else if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
        } else {
            let contracted = along(0.5);
            let contracted_value = f(&contracted);
            if contracted_value < simplex[n].1 {
                simplex[n] = (contracted, contracted_value);
            } else {
                let anchor = simplex[0].0.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let shrunk: Vec<f64> = anchor
                        .iter()
                        .zip(&vertex.0)
                        .map(|(a, p)| a + 0.5 * (p - a))
                        .collect();
                    let value = f(&shrunk);
                    *vertex = (shrunk, value);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (point, value) = simplex.swap_remove(0);
    (point, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> UsageSeries {
        UsageSeries::new(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(), values)
    }

    #[test]
    fn test_nelder_mead_quadratic() {
        let (point, value) = nelder_mead(
            |x: &[f64]| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2),
            &[0.0, 0.0],
            0.5,
        );
        assert!(value < 1e-6);
        assert!((point[0] - 1.0).abs() < 1e-3);
        assert!((point[1] + 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_series_forecast_is_flat() {
        let fitted = Sarima::new(7).fit(&series(vec![2048.0; 60])).unwrap();
        for value in fitted.forecast(90).unwrap() {
            assert!((value - 2048.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_trend_continues() {
        let values: Vec<f64> = (0..60).map(|i| 1000.0 + 5.0 * i as f64).collect();
        let fitted = Sarima::new(7).fit(&series(values)).unwrap();
        let forecast = fitted.forecast(10).unwrap();
        for (h, value) in forecast.iter().enumerate() {
            let expected = 1000.0 + 5.0 * (60 + h) as f64;
            assert!((value - expected).abs() < 1e-6, "{} != {}", value, expected);
        }
    }

    #[test]
    fn test_weekly_pattern_repeats() {
        let pattern = [10.0, 12.0, 15.0, 11.0, 9.0, 30.0, 28.0];
        let values: Vec<f64> = (0..63).map(|i| 400.0 + pattern[i % 7]).collect();
        let fitted = Sarima::new(7).fit(&series(values)).unwrap();
        let forecast = fitted.forecast(14).unwrap();
        for (h, value) in forecast.iter().enumerate() {
            let expected = 400.0 + pattern[(63 + h) % 7];
            assert!((value - expected).abs() < 1e-6, "day {}: {} != {}", h, value, expected);
        }
    }

    #[test]
    fn test_short_series_rejected() {
        let result = Sarima::new(7).fit(&series(vec![1.0; 12]));
        assert!(matches!(result, Err(ForecastError::ModelFit { .. })));
    }
}
