//! SecureDrop CLI - assess files for risk before opening them.
//!
//! Usage:
//!   securedrop ~/Downloads/invoice.pdf.exe
//!   securedrop ~/Downloads --format json
//!   securedrop suspicious.bin --details --seed 7 --config model.json

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use securedrop_core::model::{initialize_model, load_model_config, ModelConfig};
use securedrop_core::report::{print_results, OutputFormat};
use securedrop_core::scan::{run_scan, ScanProgress};

#[derive(Parser)]
#[command(name = "securedrop")]
#[command(about = "Intelligent download risk advisor")]
struct Cli {
    /// Paths to assess (files or directories)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Path to a JSON model config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the synthetic baseline (random if unset)
    #[arg(long)]
    seed: Option<u64>,

    /// Expected outlier fraction of the baseline (0.0-0.5)
    #[arg(long)]
    contamination: Option<f64>,

    /// Number of synthetic baseline rows
    #[arg(long)]
    baseline_size: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Include the extracted feature values
    #[arg(long)]
    details: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn model_config(&self) -> Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading model config from {}", path.display());
                load_model_config(path)?
            }
            None => ModelConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.baseline_seed = Some(seed);
        }
        if let Some(contamination) = self.contamination {
            config.contamination = contamination;
        }
        if let Some(size) = self.baseline_size {
            config.baseline_size = size;
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.model_config()?;
    info!(
        baseline_size = config.baseline_size,
        contamination = config.contamination,
        "Fitting anomaly model"
    );
    let model = initialize_model(&config)?;

    let progress = ScanProgress::new();
    info!("Assessing...");
    let results = run_scan(&model, &cli.paths, &progress);

    let total = progress.total_files.load(Ordering::Relaxed);
    info!(
        high_risk = progress.high_risk_count.load(Ordering::Relaxed),
        errors = progress.error_count.load(Ordering::Relaxed),
        "Assessed {total} files"
    );

    if results.is_empty() {
        info!("No files to assess.");
        return Ok(());
    }

    print_results(&results, cli.format, cli.details);

    Ok(())
}
