//! Cluster delegator CLI
//!
//! Ranks candidate clusters from live telemetry and delegates a job to the
//! best one, failing over down the ranking.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use delegator_lib::{DelegationMetrics, DelegationStrategy, Delegator};
use output::{LogFormat, OutputFormat};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cluster delegator
#[derive(Parser)]
#[command(name = "delegator")]
#[command(author, version, about = "Delegate serverless jobs to the best-ranked cluster", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short, env = "DELEGATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured strategy (static, random, load-based, topsis)
    #[arg(long, short)]
    pub strategy: Option<DelegationStrategy>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: OutputFormat,

    /// Log line format (logs go to stderr)
    #[arg(long, default_value = "json")]
    pub log_format: LogFormat,

    /// Write Prometheus metrics to this file after the command
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Gather telemetry and print the delegation plan
    Rank,

    /// Print each candidate's live cluster status
    Status,

    /// Delegate a job payload with failover
    Submit {
        /// File whose bytes are sent as the job body
        #[arg(long, short)]
        payload: PathBuf,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }
    info!(
        strategy = %config.strategy,
        candidates = config.candidates.len(),
        "Delegator configured"
    );

    let delegator = Delegator::from_config(config).context("Invalid configuration")?;
    let mut rng = StdRng::from_entropy();

    let result = match &cli.command {
        Commands::Rank => commands::rank::run(&delegator, &mut rng, cli.format).await,
        Commands::Status => commands::status::run(&delegator, cli.format).await,
        Commands::Submit { payload } => {
            commands::submit::run(&delegator, &mut rng, payload, cli.format).await
        }
    };

    if let Some(path) = &cli.metrics_out {
        std::fs::write(path, DelegationMetrics::render())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    result
}
