//! VM Capacity Forecaster CLI
//!
//! A command-line tool for forecasting VM memory usage, flagging
//! capacity risk, assigning VM profiles to inventory clusters and
//! embedding text with an exported sentence encoder.

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{cluster, embed, forecast, vms};
use forecast_lib::cluster::VmProfile;
use forecast_lib::{CapacityEvaluator, ForecastConfig, PgUsageStore};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// VM Capacity Forecaster CLI
#[derive(Parser)]
#[command(name = "capcast")]
#[command(author, version, about = "Forecast VM memory usage and flag capacity risk", long_about = None)]
pub struct Cli {
    /// Database connection URL (can also be set via DATABASE_URL env var)
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://postgres@localhost:5432/eo_datacenter"
    )]
    pub database_url: String,

    /// Seconds to wait for a database connection
    #[arg(long, env = "DATABASE_CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout: u64,

    /// Path to a configuration file overriding forecast settings
    #[arg(long, env = "FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "json")]
    pub format: output::OutputFormat,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast one VM, or every VM when none is given
    Forecast {
        /// VM name
        vm: Option<String>,

        /// Forecast every VM
        #[arg(long, conflicts_with = "vm")]
        all: bool,

        /// Output file for batch results
        #[arg(long, short, default_value = forecast::DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// List VMs with usage history
    Vms,

    /// Assign a VM profile to a cluster
    Cluster {
        /// Path to the cluster model JSON
        #[arg(long)]
        model: PathBuf,

        #[arg(long)]
        cpu: f64,

        /// Memory size
        #[arg(long)]
        memory: f64,

        #[arg(long, default_value_t = 0.0)]
        nics: f64,

        #[arg(long, default_value_t = 0.0)]
        disks: f64,

        /// Memory in use (MiB)
        #[arg(long)]
        in_use_mib: f64,

        #[arg(long)]
        sockets: f64,

        #[arg(long)]
        cores_per_socket: f64,

        /// Disk capacity (MiB)
        #[arg(long)]
        capacity_mib: f64,

        /// Provisioned memory (MiB)
        #[arg(long)]
        provisioned_mib: f64,
    },

    /// Print the sentence embedding of a text as a JSON array
    Embed {
        /// Text to embed
        text: String,

        /// Path to the ONNX sentence encoder
        #[arg(long)]
        model: PathBuf,

        /// Path to the encoder's tokenizer.json
        #[arg(long)]
        tokenizer: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let connect_timeout = Duration::from_secs(cli.connect_timeout);

    match cli.command {
        Commands::Forecast { vm, all, output } => {
            let config = ForecastConfig::load(cli.config.as_deref())
                .context("Failed to load forecast configuration")?;
            let evaluator = CapacityEvaluator::new(config)?;
            let connection =
                PgUsageStore::connect_with_timeout(&cli.database_url, connect_timeout).await;

            let target = match vm.as_deref() {
                Some(vm) if !all => forecast::Target::Vm(vm),
                _ => forecast::Target::All { output: &output },
            };
            forecast::run(&evaluator, connection, target, cli.format).await?;
        }
        Commands::Vms => {
            let store = PgUsageStore::connect_with_timeout(&cli.database_url, connect_timeout)
                .await
                .context("Failed to connect to database")?;
            let result = vms::list_vms(&store, cli.format).await;
            store.close().await;
            result?;
        }
        Commands::Cluster {
            model,
            cpu,
            memory,
            nics,
            disks,
            in_use_mib,
            sockets,
            cores_per_socket,
            capacity_mib,
            provisioned_mib,
        } => {
            let profile = VmProfile {
                cpu,
                memory,
                nics,
                disks,
                in_use_mib,
                sockets,
                cores_per_socket,
                capacity_mib,
                provisioned_mib,
            };
            cluster::predict_cluster(&model, &profile)?;
        }
        Commands::Embed {
            text,
            model,
            tokenizer,
        } => {
            embed::embed_text(&model, &tokenizer, &text)?;
        }
    }

    Ok(())
}
