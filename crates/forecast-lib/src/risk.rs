//! Capacity risk and cut-date classification
//!
//! The winning forecast is scanned for the first day whose usage exceeds the
//! provisioned capacity. When the forecast stays below capacity, the linear
//! growth over the horizon is extrapolated past its end and a crossing within
//! one more horizon is still reported as a risk.

use crate::models::{ForecastPoint, RiskAssessment, RiskStatus};
use chrono::Days;

/// Classify provisioning risk for a forecast over `horizon` days
pub fn assess(
    forecast: &[ForecastPoint],
    provisioned_mib: Option<f64>,
    horizon: usize,
) -> RiskAssessment {
    let Some(capacity) = provisioned_mib else {
        return RiskAssessment {
            status: RiskStatus::Unknown,
            cut_date: None,
            estimated_days_to_cut: None,
            provisioned_mib: None,
        };
    };

    if let Some(point) = forecast.iter().find(|p| p.yhat > capacity) {
        return RiskAssessment {
            status: RiskStatus::Risk,
            cut_date: Some(point.date),
            estimated_days_to_cut: None,
            provisioned_mib: Some(capacity),
        };
    }

    let safe = RiskAssessment {
        status: RiskStatus::Safe,
        cut_date: None,
        estimated_days_to_cut: None,
        provisioned_mib: Some(capacity),
    };

    let (Some(first), Some(last)) = (forecast.first(), forecast.last()) else {
        return safe;
    };
    if horizon == 0 {
        return safe;
    }

    let daily_growth = (last.yhat - first.yhat) / horizon as f64;
    if daily_growth <= 0.0 {
        return safe;
    }

    let remaining_margin = capacity - last.yhat;
    // float-to-int casts saturate, so a vanishing growth rate cannot overflow
    let days = (remaining_margin / daily_growth).ceil() as i64;

    if days <= horizon as i64 {
        let cut_date = u64::try_from(days)
            .ok()
            .and_then(|d| last.date.checked_add_days(Days::new(d)));
        RiskAssessment {
            status: RiskStatus::Risk,
            cut_date,
            estimated_days_to_cut: Some(days),
            provisioned_mib: Some(capacity),
        }
    } else {
        RiskAssessment {
            estimated_days_to_cut: Some(days),
            ..safe
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn training_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 22).unwrap()
    }

    fn forecast(values: impl IntoIterator<Item = f64>) -> Vec<ForecastPoint> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, yhat)| ForecastPoint {
                date: training_end() + Days::new(i as u64 + 1),
                yhat,
            })
            .collect()
    }

    #[test]
    fn test_unknown_without_capacity() {
        let result = assess(&forecast(vec![5000.0; 90]), None, 90);
        assert_eq!(result.status, RiskStatus::Unknown);
        assert_eq!(result.cut_date, None);
        assert_eq!(result.estimated_days_to_cut, None);
        assert_eq!(result.provisioned_mib, None);
    }

    #[test]
    fn test_flat_below_capacity_is_safe() {
        let result = assess(&forecast(vec![1000.0; 90]), Some(2048.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
        assert_eq!(result.cut_date, None);
        assert_eq!(result.estimated_days_to_cut, None);
        assert_eq!(result.provisioned_mib, Some(2048.0));
    }

    #[test]
    fn test_direct_crossing_on_day_ten() {
        let values = (1..=90).map(|day| if day >= 10 { 2100.0 } else { 1500.0 });
        let result = assess(&forecast(values), Some(2048.0), 90);
        assert_eq!(result.status, RiskStatus::Risk);
        assert_eq!(result.cut_date, Some(training_end() + Days::new(10)));
        assert_eq!(result.estimated_days_to_cut, None);
    }

    #[test]
    fn test_equal_to_capacity_is_not_a_crossing() {
        let result = assess(&forecast(vec![2048.0; 90]), Some(2048.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
    }

    #[test]
    fn test_zero_growth_is_safe_regardless_of_capacity() {
        let mut values = vec![1000.0; 90];
        values[45] = 1900.0;
        let result = assess(&forecast(values), Some(1901.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
        assert_eq!(result.cut_date, None);
    }

    #[test]
    fn test_declining_usage_is_safe() {
        let values = (0..90).map(|i| 1800.0 - i as f64);
        let result = assess(&forecast(values), Some(2048.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
        assert_eq!(result.estimated_days_to_cut, None);
    }

    #[test]
    fn test_extrapolated_crossing_within_horizon() {
        // 1000 -> 1900 over 90 days: growth 10/day, 100 MiB left
        let values = (0..90).map(|i| 1000.0 + 900.0 * i as f64 / 89.0);
        let result = assess(&forecast(values), Some(2000.0), 90);
        let last = training_end() + Days::new(90);
        assert_eq!(result.status, RiskStatus::Risk);
        assert_eq!(result.estimated_days_to_cut, Some(10));
        assert_eq!(result.cut_date, Some(last + Days::new(10)));
    }

    #[test]
    fn test_extrapolated_crossing_beyond_horizon() {
        // growth 1/day, 500 MiB left
        let values = (0..90).map(|i| 1000.0 + 90.0 * i as f64 / 89.0);
        let result = assess(&forecast(values), Some(1590.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
        assert_eq!(result.cut_date, None);
        assert_eq!(result.estimated_days_to_cut, Some(500));
    }

    #[test]
    fn test_empty_forecast_is_safe() {
        let result = assess(&[], Some(1024.0), 90);
        assert_eq!(result.status, RiskStatus::Safe);
    }
}
