//! Forecast model variants and their comparison
//!
//! Every variant is fitted on the same training prefix, scored against the
//! same held-out suffix, and forecasts the same future horizon starting the
//! day after training ends.

mod sarima;
mod seasonal_naive;
mod seasonal_regression;

pub use sarima::Sarima;
pub use seasonal_naive::SeasonalNaive;
pub use seasonal_regression::SeasonalRegression;

use crate::error::ForecastError;
use crate::models::{ForecastPoint, ForecastResult};
use crate::series::UsageSeries;

/// Trait for forecast model variants
pub trait ForecastModel: Send + Sync {
    /// Name reported as `best_model`
    fn name(&self) -> &'static str;

    /// Fit the model on a training series
    fn fit(&self, train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError>;
}

/// A model fitted on one training series
pub trait FittedModel {
    /// Predict `horizon` values following the end of the training series
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError>;

    /// Predict the held-out window used for scoring
    fn backtest(&self, test_days: usize) -> Result<Vec<f64>, ForecastError> {
        self.forecast(test_days)
    }
}

/// Fixed, ordered set of model variants
pub struct ModelComparison {
    models: Vec<Box<dyn ForecastModel>>,
}

impl ModelComparison {
    /// Seasonal regression, seasonal ARIMA and seasonal naive, in that order
    pub fn standard(season_period: usize) -> Self {
        Self::with_models(vec![
            Box::new(SeasonalRegression::new(season_period)),
            Box::new(Sarima::new(season_period)),
            Box::new(SeasonalNaive::new(season_period)),
        ])
    }

    pub fn with_models(models: Vec<Box<dyn ForecastModel>>) -> Self {
        Self { models }
    }

    pub fn model_names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    /// Score every variant in order; any failure fails the whole comparison
    pub fn compare(
        &self,
        train: &UsageSeries,
        test: &UsageSeries,
        horizon: usize,
    ) -> Result<Vec<ForecastResult>, ForecastError> {
        self.models
            .iter()
            .map(|model| evaluate_model(model.as_ref(), train, test, horizon))
            .collect()
    }
}

fn evaluate_model(
    model: &dyn ForecastModel,
    train: &UsageSeries,
    test: &UsageSeries,
    horizon: usize,
) -> Result<ForecastResult, ForecastError> {
    let name = model.name();
    let fitted = model.fit(train)?;

    let predicted = fitted.backtest(test.len())?;
    check_prediction(name, &predicted, test.len())?;

    let future = fitted.forecast(horizon)?;
    check_prediction(name, &future, horizon)?;

    let forecast = future
        .iter()
        .enumerate()
        .map(|(i, yhat)| ForecastPoint {
            date: train.date_at(train.len() + i),
            yhat: *yhat,
        })
        .collect();

    Ok(ForecastResult {
        model: name,
        rmse: rmse(test.values(), &predicted),
        mae: mae(test.values(), &predicted),
        forecast,
    })
}

fn check_prediction(model: &str, values: &[f64], expected: usize) -> Result<(), ForecastError> {
    if values.len() != expected {
        return Err(ForecastError::model_fit(
            model,
            format!("predicted {} values, expected {}", values.len(), expected),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::model_fit(model, "prediction is not finite"));
    }
    Ok(())
}

/// Pick the variant with the lowest RMSE; the first one evaluated wins ties.
///
/// The winner's forecast is restricted to its last `horizon` entries.
pub fn select_best(results: Vec<ForecastResult>, horizon: usize) -> Option<ForecastResult> {
    let mut best: Option<ForecastResult> = None;
    for result in results {
        match &best {
            Some(current) if result.rmse >= current.rmse => {}
            _ => best = Some(result),
        }
    }

    best.map(|mut winner| {
        let skip = winner.forecast.len().saturating_sub(horizon);
        winner.forecast.drain(..skip);
        winner
    })
}

/// Root-mean-squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sum_sq / actual.len() as f64).sqrt()
}

/// Mean absolute error
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum();
    sum / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn result(model: &'static str, rmse: f64, len: usize) -> ForecastResult {
        ForecastResult {
            model,
            rmse,
            mae: rmse,
            forecast: (0..len)
                .map(|i| ForecastPoint {
                    date: start() + chrono::Days::new(i as u64),
                    yhat: i as f64,
                })
                .collect(),
        }
    }

    struct Constant(&'static str, f64);

    impl ForecastModel for Constant {
        fn name(&self) -> &'static str {
            self.0
        }

        fn fit(&self, _train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError> {
            Ok(Box::new(ConstantFit(self.1)))
        }
    }

    struct ConstantFit(f64);

    impl FittedModel for ConstantFit {
        fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
            Ok(vec![self.0; horizon])
        }
    }

    struct Broken;

    impl ForecastModel for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }

        fn fit(&self, _train: &UsageSeries) -> Result<Box<dyn FittedModel>, ForecastError> {
            Err(ForecastError::model_fit("Broken", "singular system"))
        }
    }

    #[test]
    fn test_metrics() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [2.0, 2.0, 1.0, 4.0];
        assert!((rmse(&actual, &predicted) - 1.118).abs() < 0.001);
        assert!((mae(&actual, &predicted) - 0.75).abs() < 1e-12);
        assert_eq!(rmse(&[], &[]), 0.0);
    }

    #[test]
    fn test_select_lowest_rmse() {
        let results = vec![
            result("Seasonal Regression", 5.0, 3),
            result("SARIMA", 2.0, 3),
            result("Seasonal Naive", 3.0, 3),
        ];
        let best = select_best(results, 3).unwrap();
        assert_eq!(best.model, "SARIMA");
    }

    #[test]
    fn test_ties_resolve_to_evaluation_order() {
        let results = vec![
            result("Seasonal Regression", 4.0, 3),
            result("SARIMA", 2.0, 3),
            result("Seasonal Naive", 2.0, 3),
        ];
        assert_eq!(select_best(results, 3).unwrap().model, "SARIMA");

        let all_equal = vec![
            result("Seasonal Regression", 1.0, 3),
            result("SARIMA", 1.0, 3),
            result("Seasonal Naive", 1.0, 3),
        ];
        assert_eq!(select_best(all_equal, 3).unwrap().model, "Seasonal Regression");
    }

    #[test]
    fn test_select_restricts_to_horizon() {
        let best = select_best(vec![result("SARIMA", 1.0, 10)], 4).unwrap();
        assert_eq!(best.forecast.len(), 4);
        assert_eq!(best.forecast[0].yhat, 6.0);
    }

    #[test]
    fn test_select_empty() {
        assert!(select_best(Vec::new(), 90).is_none());
    }

    #[test]
    fn test_compare_scores_each_variant() {
        let train = UsageSeries::new(start(), vec![10.0; 20]);
        let test = UsageSeries::new(train.date_at(20), vec![12.0; 5]);
        let comparison = ModelComparison::with_models(vec![
            Box::new(Constant("low", 10.0)),
            Box::new(Constant("exact", 12.0)),
        ]);

        let results = comparison.compare(&train, &test, 7).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].model, "low");
        assert!((results[0].rmse - 2.0).abs() < 1e-12);
        assert_eq!(results[1].rmse, 0.0);
        assert_eq!(results[1].forecast.len(), 7);
        assert_eq!(results[1].forecast[0].date, train.date_at(20));
    }

    #[test]
    fn test_compare_fails_when_any_variant_fails() {
        let train = UsageSeries::new(start(), vec![10.0; 20]);
        let test = UsageSeries::new(train.date_at(20), vec![12.0; 5]);
        let comparison = ModelComparison::with_models(vec![
            Box::new(Constant("ok", 10.0)),
            Box::new(Broken),
        ]);

        let err = comparison.compare(&train, &test, 7).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit { ref model, .. } if model == "Broken"));
    }

    #[test]
    fn test_non_finite_prediction_rejected() {
        let train = UsageSeries::new(start(), vec![10.0; 20]);
        let test = UsageSeries::new(train.date_at(20), vec![12.0; 5]);
        let comparison = ModelComparison::with_models(vec![Box::new(Constant("nan", f64::NAN))]);

        assert!(matches!(
            comparison.compare(&train, &test, 7),
            Err(ForecastError::ModelFit { .. })
        ));
    }

    #[test]
    fn test_standard_order() {
        assert_eq!(
            ModelComparison::standard(7).model_names(),
            vec!["Seasonal Regression", "SARIMA", "Seasonal Naive"]
        );
    }
}
