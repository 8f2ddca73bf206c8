//! Daily usage series preparation
//!
//! Collapses raw usage rows into a dense daily series: duplicate dates are
//! averaged, the series is reindexed to one value per calendar day and
//! missing days are filled by linear interpolation.

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::models::UsageRecord;
use chrono::{Days, NaiveDate};
use std::collections::BTreeMap;

/// Dense daily usage series for one VM
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl UsageSeries {
    /// Build a series from contiguous daily values starting at `start`
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    /// Validate and densify the raw records of one VM
    pub fn prepare(
        vm: &str,
        records: &[UsageRecord],
        config: &ForecastConfig,
    ) -> Result<Self, ForecastError> {
        let required = config.required_records();
        if records.len() < required {
            return Err(ForecastError::InsufficientData {
                vm: vm.to_string(),
                found: records.len(),
                required,
            });
        }

        let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for record in records {
            let entry = by_date.entry(record.date).or_insert((0.0, 0));
            entry.0 += record.in_use_mib;
            entry.1 += 1;
        }
        let daily: Vec<(NaiveDate, f64)> = by_date
            .into_iter()
            .map(|(date, (sum, count))| (date, sum / count as f64))
            .collect();

        Ok(Self::interpolate(&daily))
    }

    /// Reindex sorted, de-duplicated points to daily frequency
    fn interpolate(daily: &[(NaiveDate, f64)]) -> Self {
        let Some(&(start, first)) = daily.first() else {
            return Self::new(NaiveDate::MIN, Vec::new());
        };

        let mut values = vec![first];
        for pair in daily.windows(2) {
            let (from_date, from) = pair[0];
            let (to_date, to) = pair[1];
            let gap = (to_date - from_date).num_days();
            for step in 1..=gap {
                values.push(from + (to - from) * step as f64 / gap as f64);
            }
        }

        Self::new(start, values)
    }

    /// Split into a training prefix and a held-out suffix of `test_days`
    pub fn split(&self, test_days: usize) -> (UsageSeries, UsageSeries) {
        let cut = self.values.len().saturating_sub(test_days);
        let train = Self::new(self.start, self.values[..cut].to_vec());
        let test = Self::new(self.date_at(cut), self.values[cut..].to_vec());
        (train, test)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last covered date (the start date for an empty series)
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len().saturating_sub(1))
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start
            .checked_add_days(Days::new(index as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The last `n` values (all of them when the series is shorter)
    pub fn tail(&self, n: usize) -> &[f64] {
        &self.values[self.values.len().saturating_sub(n)..]
    }

    /// Iterate `(date, value)` pairs in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, value)| (self.date_at(i), *value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn small_config() -> ForecastConfig {
        ForecastConfig {
            test_days: 2,
            min_train_days: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_insufficient_records() {
        let config = ForecastConfig::default();
        let records: Vec<UsageRecord> = (0..89)
            .map(|i| UsageRecord::new(date(2024, 9, 1) + Days::new(i), 100.0))
            .collect();

        match UsageSeries::prepare("vm-01", &records, &config) {
            Err(ForecastError::InsufficientData { found, required, .. }) => {
                assert_eq!(found, 89);
                assert_eq!(required, 90);
            }
            other => panic!("expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_records() {
        let result = UsageSeries::prepare("vm-01", &[], &ForecastConfig::default());
        assert!(matches!(result, Err(ForecastError::InsufficientData { found: 0, .. })));
    }

    #[test]
    fn test_duplicates_averaged_and_gaps_interpolated() {
        let records = vec![
            UsageRecord::new(date(2024, 9, 5), 400.0),
            UsageRecord::new(date(2024, 9, 1), 100.0),
            UsageRecord::new(date(2024, 9, 1), 300.0),
            UsageRecord::new(date(2024, 9, 2), 200.0),
        ];
        let series = UsageSeries::prepare("vm-01", &records, &small_config()).unwrap();

        assert_eq!(series.start(), date(2024, 9, 1));
        assert_eq!(series.end(), date(2024, 9, 5));
        let expected = [200.0, 200.0, 266.667, 333.333, 400.0];
        assert_eq!(series.len(), expected.len());
        for (actual, expected) in series.values().iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-3, "{} != {}", actual, expected);
        }
    }

    #[test]
    fn test_split_and_tail() {
        let series = UsageSeries::new(date(2024, 9, 1), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let (train, test) = series.split(2);

        assert_eq!(train.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(train.end(), date(2024, 9, 3));
        assert_eq!(test.values(), &[4.0, 5.0]);
        assert_eq!(test.start(), date(2024, 9, 4));
        assert_eq!(series.tail(2), &[4.0, 5.0]);
        assert_eq!(series.tail(10).len(), 5);
    }

    #[test]
    fn test_iter_dates_contiguous() {
        let series = UsageSeries::new(date(2024, 12, 30), vec![1.0, 2.0, 3.0]);
        let dates: Vec<NaiveDate> = series.iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![date(2024, 12, 30), date(2024, 12, 31), date(2025, 1, 1)]);
    }
}
