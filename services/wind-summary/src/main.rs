//! Wind summary batch job.
//!
//! Computes median wind speed and dominant wind sector over an area of
//! interest from daily u/v wind grids and exports both as Zarr rasters.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use wind_summary::{plan_exports, run, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "wind-summary")]
#[command(about = "Median wind speed and dominant wind sector over an area of interest")]
struct Args {
    /// Run configuration file
    #[arg(short, long, env = "WIND_SUMMARY_CONFIG", default_value = "config/wind-summary.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Validate the configuration, print the export plan and exit
    #[arg(long)]
    validate_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = RunConfig::load(&args.config)?;
    info!(
        config = %args.config.display(),
        aoi = config.aoi.name(),
        window = %config.period,
        source = %config.source.root.display(),
        export = %config.export.root.display(),
        "Loaded configuration"
    );

    if args.validate_only {
        let plans = plan_exports(&config)?;
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    match run(&config).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Wind summary run failed");
            Err(e)
        }
    }
}
