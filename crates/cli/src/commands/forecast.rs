//! Capacity forecast commands

use anyhow::{Context, Result};
use colored::Colorize;
use forecast_lib::{
    CapacityEvaluator, ForecastError, ForecastReport, PgUsageStore, UsageStore, VmOutcome,
};
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use crate::output::{color_status, format_mib, print_info, print_json, print_success, OutputFormat};

/// Default batch output file
pub const DEFAULT_OUTPUT: &str = "forecast_results.json";

/// What a forecast invocation covers
pub enum Target<'a> {
    Vm(&'a str),
    All { output: &'a Path },
}

/// Row for forecast table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Forecast")]
    yhat: String,
}

/// Run a forecast against the database, reporting connection failures the
/// same way the target reports its own errors
pub async fn run(
    evaluator: &CapacityEvaluator,
    connection: Result<PgUsageStore, ForecastError>,
    target: Target<'_>,
    format: OutputFormat,
) -> Result<()> {
    let store = match connection {
        Ok(store) => store,
        Err(e) => {
            return match target {
                Target::Vm(vm) => show_outcome(
                    &VmOutcome::Failed {
                        vm: vm.to_string(),
                        error: e.to_string(),
                    },
                    format,
                ),
                Target::All { .. } => print_json(&json!({ "error": e.to_string() })),
            };
        }
    };

    let result = match target {
        Target::Vm(vm) => forecast_vm(evaluator, &store, vm, format).await,
        Target::All { output } => forecast_all(evaluator, &store, output).await,
    };
    store.close().await;
    result
}

/// Forecast one VM and print the result
pub async fn forecast_vm(
    evaluator: &CapacityEvaluator,
    store: &dyn UsageStore,
    vm: &str,
    format: OutputFormat,
) -> Result<()> {
    let outcome = evaluator.evaluate_outcome(store, vm).await;
    show_outcome(&outcome, format)
}

/// Forecast every known VM and write the results to `output`
pub async fn forecast_all(
    evaluator: &CapacityEvaluator,
    store: &dyn UsageStore,
    output: &Path,
) -> Result<()> {
    let outcomes = match evaluator
        .run_batch(store, |vm| print_info(&format!("Forecasting: {}", vm)))
        .await
    {
        Ok(outcomes) => outcomes,
        Err(e) => return print_json(&json!({ "error": e.to_string() })),
    };

    let content = serde_json::to_string_pretty(&outcomes).context("Failed to serialize forecasts")?;
    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_success(&format!("Forecasts saved to {}", output.display()));
    Ok(())
}

fn show_outcome(outcome: &VmOutcome, format: OutputFormat) -> Result<()> {
    match (format, outcome) {
        (OutputFormat::Table, VmOutcome::Report(report)) => {
            print_report_table(report);
            Ok(())
        }
        (OutputFormat::Table, VmOutcome::Failed { vm, error }) => {
            println!("{} {}: {}", "✗".red().bold(), vm.cyan(), error);
            Ok(())
        }
        (OutputFormat::Json, outcome) => print_json(outcome),
    }
}

fn print_report_table(report: &ForecastReport) {
    println!("{}", "Capacity Forecast".bold());
    println!("{}", "=".repeat(50));
    println!("VM:                     {}", report.vm.cyan());
    println!("Best Model:             {}", report.best_model);
    println!("RMSE / MAE:             {:.2} / {:.2}", report.rmse, report.mae);
    println!(
        "Provisioned:            {}",
        report
            .provisioned_mib
            .map(format_mib)
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Status:                 {}", color_status(report.status));
    if let Some(cut_date) = report.cut_date {
        println!("Cut Date:               {}", cut_date.to_string().red());
    }
    if let Some(days) = report.estimated_days_to_cut {
        println!("Est. Days to Cut:       {}", days);
    }
    println!();

    let rows: Vec<ForecastRow> = report
        .forecast
        .iter()
        .map(|p| ForecastRow {
            date: p.date.to_string(),
            yhat: format_mib(p.yhat),
        })
        .collect();

    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_lib::{ForecastConfig, MemoryStore, UsageRecord};

    fn daily(days: usize, in_use_mib: f64) -> Vec<UsageRecord> {
        let mut date = ForecastConfig::default().history_start;
        let mut records = Vec::with_capacity(days);
        for _ in 0..days {
            records.push(UsageRecord::new(date, in_use_mib));
            date = date.succ_opt().unwrap();
        }
        records
    }

    fn evaluator() -> CapacityEvaluator {
        CapacityEvaluator::new(ForecastConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_forecast_all_writes_every_outcome() {
        let store = MemoryStore::new()
            .with_usage("vm-a", daily(120, 2048.0))
            .with_capacity("vm-a", 8192.0)
            .with_usage("vm-b", daily(10, 1024.0));
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("results.json");

        forecast_all(&evaluator(), &store, &output).await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0]["vm"], "vm-a");
        assert_eq!(entries[0]["status"], "safe");
        assert_eq!(entries[0]["provisioned_mib"], 8192.0);
        assert_eq!(entries[0]["forecast"].as_array().unwrap().len(), 90);
        assert!(entries[0].get("error").is_none());

        assert_eq!(entries[1]["vm"], "vm-b");
        assert_eq!(entries[1]["error"], "Not enough data for VM: vm-b");
        assert!(entries[1].get("forecast").is_none());
    }

    #[tokio::test]
    async fn test_forecast_all_listing_failure_writes_no_file() {
        let store = MemoryStore::new()
            .with_usage("vm-a", daily(120, 2048.0))
            .with_lookup_failure("relation \"info\" does not exist");
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("results.json");

        forecast_all(&evaluator(), &store, &output).await.unwrap();

        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_forecast_vm_reports_failure_as_entry() {
        let store = MemoryStore::new();
        forecast_vm(&evaluator(), &store, "missing", OutputFormat::Json)
            .await
            .unwrap();
    }
}
