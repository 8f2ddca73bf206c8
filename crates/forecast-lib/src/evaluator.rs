//! Per-VM capacity pipeline and batch orchestration
//!
//! For one VM: load usage history, densify it, split off the test window,
//! compare the model variants, keep the best, look up the provisioned
//! capacity and classify the risk. Batch runs repeat this sequentially for
//! every known VM, turning per-VM errors into error entries.

use crate::config::ForecastConfig;
use crate::error::{ConfigError, ForecastError};
use crate::models::{ForecastReport, VmOutcome};
use crate::observability::StructuredLogger;
use crate::predictor::{select_best, ModelComparison};
use crate::risk;
use crate::series::UsageSeries;
use crate::store::UsageStore;

/// Capacity risk evaluator
pub struct CapacityEvaluator {
    config: ForecastConfig,
    comparison: ModelComparison,
    logger: StructuredLogger,
}

impl CapacityEvaluator {
    /// Create an evaluator with the standard model variants
    pub fn new(config: ForecastConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let comparison = ModelComparison::standard(config.season_period);
        Ok(Self {
            config,
            comparison,
            logger: StructuredLogger::default(),
        })
    }

    /// Replace the model variants
    pub fn with_comparison(mut self, comparison: ModelComparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Run the full pipeline for one VM
    pub async fn evaluate(
        &self,
        store: &dyn UsageStore,
        vm: &str,
    ) -> Result<ForecastReport, ForecastError> {
        let records = store
            .usage_history(vm, self.config.history_start, self.config.history_end)
            .await?;
        self.logger.log_forecast_started(vm, records.len());

        let series = UsageSeries::prepare(vm, &records, &self.config)?;
        let (train, test) = series.split(self.config.test_days);

        let results = self
            .comparison
            .compare(&train, &test, self.config.forecast_days)?;
        for result in &results {
            self.logger.log_model_scored(vm, result);
        }

        let best = select_best(results, self.config.forecast_days)
            .ok_or_else(|| ForecastError::model_fit("comparison", "no model variants configured"))?;
        self.logger.log_best_model(vm, &best);

        let provisioned_mib = store.provisioned_capacity(vm).await?;
        let assessment = risk::assess(&best.forecast, provisioned_mib, self.config.forecast_days);
        self.logger.log_assessment(vm, &assessment);

        Ok(ForecastReport::new(vm, best, assessment))
    }

    /// Run the pipeline for one VM, downgrading any error to an error entry
    pub async fn evaluate_outcome(&self, store: &dyn UsageStore, vm: &str) -> VmOutcome {
        match self.evaluate(store, vm).await {
            Ok(report) => VmOutcome::Report(report),
            Err(e) => {
                let error = e.to_string();
                self.logger.log_failure(vm, &error);
                VmOutcome::Failed {
                    vm: vm.to_string(),
                    error,
                }
            }
        }
    }

    /// Evaluate every known VM in listing order.
    ///
    /// `on_progress` is called with each VM before its pipeline runs. Only a
    /// failure to list the VMs fails the run.
    pub async fn run_batch<F>(
        &self,
        store: &dyn UsageStore,
        mut on_progress: F,
    ) -> Result<Vec<VmOutcome>, ForecastError>
    where
        F: FnMut(&str),
    {
        let vms = store.list_vms().await?;

        let mut outcomes = Vec::with_capacity(vms.len());
        for vm in &vms {
            on_progress(vm);
            outcomes.push(self.evaluate_outcome(store, vm).await);
        }

        let failed = outcomes.iter().filter(|o| o.is_failed()).count();
        self.logger.log_batch_completed(outcomes.len(), failed);
        Ok(outcomes)
    }
}
