//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use forecast_lib::RiskStatus;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Table format
    Table,
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format MiB as human-readable string
pub fn format_mib(mib: f64) -> String {
    const GIB: f64 = 1024.0;
    const TIB: f64 = GIB * 1024.0;

    if mib >= TIB {
        format!("{:.2}Ti", mib / TIB)
    } else if mib >= GIB {
        format!("{:.2}Gi", mib / GIB)
    } else {
        format!("{:.0}Mi", mib)
    }
}

/// Color status based on value
pub fn color_status(status: RiskStatus) -> String {
    match status {
        RiskStatus::Risk => status.as_str().red().bold().to_string(),
        RiskStatus::Safe => status.as_str().green().to_string(),
        RiskStatus::Unknown => status.as_str().yellow().to_string(),
    }
}
