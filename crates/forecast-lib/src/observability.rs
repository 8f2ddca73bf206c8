//! Structured event logging for forecast runs
//!
//! Every significant step of a run is logged with a stable `event` field so
//! JSON log output can be filtered per VM and per stage.

use crate::models::{ForecastResult, RiskAssessment};
use tracing::{debug, info, warn};

/// Structured logger for forecaster events
#[derive(Clone)]
pub struct StructuredLogger {
    run_id: String,
}

impl StructuredLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log the start of one VM's pipeline
    pub fn log_forecast_started(&self, vm: &str, records: usize) {
        info!(
            event = "forecast_started",
            run_id = %self.run_id,
            vm = %vm,
            records = records,
            "Forecasting VM"
        );
    }

    /// Log the score of one model variant
    pub fn log_model_scored(&self, vm: &str, result: &ForecastResult) {
        debug!(
            event = "model_scored",
            run_id = %self.run_id,
            vm = %vm,
            model = %result.model,
            rmse = result.rmse,
            mae = result.mae,
            "Model variant scored"
        );
    }

    /// Log the winning model variant
    pub fn log_best_model(&self, vm: &str, result: &ForecastResult) {
        info!(
            event = "best_model_selected",
            run_id = %self.run_id,
            vm = %vm,
            model = %result.model,
            rmse = result.rmse,
            mae = result.mae,
            "Selected best model"
        );
    }

    /// Log the capacity classification
    pub fn log_assessment(&self, vm: &str, assessment: &RiskAssessment) {
        let cut_date = assessment.cut_date.map(|d| d.to_string());
        info!(
            event = "capacity_assessed",
            run_id = %self.run_id,
            vm = %vm,
            status = %assessment.status,
            provisioned_mib = ?assessment.provisioned_mib,
            cut_date = ?cut_date,
            estimated_days_to_cut = ?assessment.estimated_days_to_cut,
            "Capacity risk assessed"
        );
    }

    /// Log a per-VM failure that was downgraded to an error entry
    pub fn log_failure(&self, vm: &str, error: &str) {
        warn!(
            event = "forecast_failed",
            run_id = %self.run_id,
            vm = %vm,
            error = %error,
            "Forecast failed"
        );
    }

    /// Log the end of a batch run
    pub fn log_batch_completed(&self, total: usize, failed: usize) {
        if failed == 0 {
            info!(
                event = "batch_completed",
                run_id = %self.run_id,
                total = total,
                failed = failed,
                "Batch forecast completed"
            );
        } else {
            warn!(
                event = "batch_completed",
                run_id = %self.run_id,
                total = total,
                failed = failed,
                "Batch forecast completed with failures"
            );
        }
    }
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new(chrono::Utc::now().format("%Y%m%dT%H%M%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("run-1");
        assert_eq!(logger.run_id(), "run-1");
    }

    #[test]
    fn test_default_run_id_is_timestamp() {
        let logger = StructuredLogger::default();
        assert_eq!(logger.run_id().len(), 15);
        assert!(logger.run_id().contains('T'));
    }
}
