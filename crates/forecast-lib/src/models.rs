//! Core data models for the capacity forecaster

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw usage row as returned by the data store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub in_use_mib: f64,
}

impl UsageRecord {
    pub fn new(date: NaiveDate, in_use_mib: f64) -> Self {
        Self { date, in_use_mib }
    }
}

/// A single forecast value; dates serialize as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
}

/// Scored output of one model variant
#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub model: &'static str,
    pub rmse: f64,
    pub mae: f64,
    /// Predicted series over the future horizon, starting the day after training ends
    pub forecast: Vec<ForecastPoint>,
}

/// Provisioning risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    Risk,
    Safe,
    Unknown,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Risk => "risk",
            RiskStatus::Safe => "safe",
            RiskStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived capacity risk for one VM
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub status: RiskStatus,
    pub cut_date: Option<NaiveDate>,
    pub estimated_days_to_cut: Option<i64>,
    pub provisioned_mib: Option<f64>,
}

/// Full forecast report for one VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub vm: String,
    pub best_model: String,
    pub rmse: f64,
    pub mae: f64,
    pub provisioned_mib: Option<f64>,
    pub cut_date: Option<NaiveDate>,
    pub status: RiskStatus,
    pub estimated_days_to_cut: Option<i64>,
    pub forecast: Vec<ForecastPoint>,
}

impl ForecastReport {
    /// Shape the winning result and its risk assessment into the output schema
    pub fn new(vm: impl Into<String>, best: ForecastResult, assessment: RiskAssessment) -> Self {
        Self {
            vm: vm.into(),
            best_model: best.model.to_string(),
            rmse: round2(best.rmse),
            mae: round2(best.mae),
            provisioned_mib: assessment.provisioned_mib,
            cut_date: assessment.cut_date,
            status: assessment.status,
            estimated_days_to_cut: assessment.estimated_days_to_cut,
            forecast: best.forecast,
        }
    }
}

/// Per-VM entry of a run: either a report or the error that stopped it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VmOutcome {
    Report(ForecastReport),
    Failed { vm: String, error: String },
}

impl VmOutcome {
    pub fn vm(&self) -> &str {
        match self {
            VmOutcome::Report(report) => &report.vm,
            VmOutcome::Failed { vm, .. } => vm,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VmOutcome::Failed { .. })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_schema() {
        let best = ForecastResult {
            model: "SARIMA",
            rmse: 12.3456,
            mae: 9.871,
            forecast: vec![ForecastPoint { date: date(2025, 1, 23), yhat: 2048.5 }],
        };
        let assessment = RiskAssessment {
            status: RiskStatus::Risk,
            cut_date: Some(date(2025, 1, 23)),
            estimated_days_to_cut: None,
            provisioned_mib: Some(2048.0),
        };

        let value = serde_json::to_value(ForecastReport::new("vm-01", best, assessment)).unwrap();
        assert_eq!(
            value,
            json!({
                "vm": "vm-01",
                "best_model": "SARIMA",
                "rmse": 12.35,
                "mae": 9.87,
                "provisioned_mib": 2048.0,
                "cut_date": "2025-01-23",
                "status": "risk",
                "estimated_days_to_cut": null,
                "forecast": [{"date": "2025-01-23", "yhat": 2048.5}]
            })
        );
    }

    #[test]
    fn test_failed_outcome_has_no_forecast() {
        let outcome = VmOutcome::Failed {
            vm: "vm-02".to_string(),
            error: "Not enough data for VM: vm-02".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["error"], "Not enough data for VM: vm-02");
        assert!(value.get("forecast").is_none());
        assert!(outcome.is_failed());
        assert_eq!(outcome.vm(), "vm-02");
    }

    #[test]
    fn test_outcome_roundtrip_picks_report() {
        let raw = json!({
            "vm": "vm-03",
            "best_model": "Seasonal Naive",
            "rmse": 1.0,
            "mae": 1.0,
            "provisioned_mib": null,
            "cut_date": null,
            "status": "unknown",
            "estimated_days_to_cut": null,
            "forecast": []
        });
        let outcome: VmOutcome = serde_json::from_value(raw).unwrap();
        assert!(!outcome.is_failed());
    }
}
