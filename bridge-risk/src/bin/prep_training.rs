//! Turn a probe-tick NDJSON export into labelled training CSVs.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bridge_risk::training::{self, TrainingError};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input NDJSON file
    #[arg(long)]
    input: PathBuf,

    /// Output CSV path; per-horizon files are written next to it
    #[arg(long)]
    output: PathBuf,

    /// Comma-separated horizons in minutes
    #[arg(long, value_delimiter = ',', default_value = "0,3,6,9,12")]
    horizons: Vec<u32>,

    /// Share of rows, latest first, held out for validation
    #[arg(long, default_value_t = 0.3)]
    validation_fraction: f64,
}

fn run(cli: &Cli) -> Result<(), TrainingError> {
    let file = std::fs::File::open(&cli.input)?;
    let ticks = training::load_ndjson(std::io::BufReader::new(file))?;
    let written =
        training::write_horizon_files(&ticks, &cli.horizons, &cli.output, cli.validation_fraction)?;
    info!(files = written.len(), "Training data preparation complete");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!(error = %e, input = %cli.input.display(), "Training data preparation failed");
        std::process::exit(1);
    }
}
