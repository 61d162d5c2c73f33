//! `kitewindows` command-line entry point
//!
//! ```bash
//! # Use ./config.json or the user config directory
//! kitewindows
//!
//! # Explicit config, fresh data, report into ./reports
//! kitewindows --config spots.json --no-cache --out-dir reports -v
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use kitewindows::kitesurfing::SpotStatus;
use kitewindows::{
    AnalysisError, CachedProvider, ForecastCache, ForecastProvider, ForecastReport,
    KiteForecastService, KiteWindowsConfig, KiteWindowsError, OpenMeteoProvider, logging,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "kitewindows",
    version,
    about = "Kitesurfing wind windows from AROME forecasts",
    long_about = "Fetches hourly and 15-minute wind forecasts for the configured spots, \
                  and reports contiguous windows where direction, speed, rain and daylight \
                  all allow kitesurfing."
)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory the windows.json report is written to
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Always fetch fresh forecasts
    #[arg(long)]
    no_cache: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = describe(&e);
            error!("{message}");
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = KiteWindowsConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let provider = OpenMeteoProvider::new(config.forecast.clone())?;
    let report = if config.cache.enabled && !cli.no_cache {
        let cache = ForecastCache::open(&config.cache.location)?;
        let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
        let cached = CachedProvider::new(provider, cache, config.forecast.model.clone(), ttl);
        generate(&cached, &config).await?
    } else {
        generate(&provider, &config).await?
    };

    let path = report.write_json(&cli.out_dir)?;
    log_outcome(&report);
    println!("{}", path.display());
    Ok(())
}

async fn generate(
    provider: &dyn ForecastProvider,
    config: &KiteWindowsConfig,
) -> Result<ForecastReport> {
    KiteForecastService::generate(provider, config).await
}

fn log_outcome(report: &ForecastReport) {
    for spot in &report.spots {
        match (spot.status, &spot.error) {
            (_, Some(err)) => warn!(spot = %spot.spot.name, "Forecast unavailable: {err}"),
            (SpotStatus::NoData, None) => warn!(spot = %spot.spot.name, "No usable samples"),
            (SpotStatus::Unsuitable, None) => {
                info!(spot = %spot.spot.name, "No kiteable window");
            }
            (SpotStatus::Kiteable, None) => {
                for window in &spot.windows {
                    info!(
                        spot = %spot.spot.name,
                        date = %window.start_ts.date_naive(),
                        span = %window.format_span(),
                        band = %window.weakest_band,
                        "Kiteable window of {:.2}h",
                        window.duration_hours
                    );
                }
            }
        }
    }
}

/// Full error chain, followed by the friendly hint of a typed error in the chain
fn describe(e: &anyhow::Error) -> String {
    let hint = if let Some(err) = e.downcast_ref::<KiteWindowsError>() {
        Some(err.user_message())
    } else {
        e.downcast_ref::<AnalysisError>()
            .map(|err| KiteWindowsError::from(err.clone()).user_message())
    };
    match hint {
        Some(hint) => format!("{e:#}\n{hint}"),
        None => format!("{e:#}"),
    }
}
