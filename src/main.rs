use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;
use wxflights::{
    default_networks, get_data_dir, DownloadTarget, Downloader, ObservationWindow,
    PipelineConfig, DEFAULT_MAX_WORKERS,
};

/// Download hourly ASOS weather observations and airline on-time records
/// into local Parquet stores.
#[derive(Parser, Debug)]
#[command(name = "wxflights", version, about)]
struct Cli {
    /// Which datasets to download
    #[arg(long, value_enum, default_value_t = DownloadTarget::Weather)]
    target: DownloadTarget,

    /// Data directory (defaults to the platform data directory)
    #[arg(long, env = "WXFLIGHTS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// First observation day, YYYY-MM-DD
    #[arg(long, default_value = "2017-01-01")]
    start: NaiveDate,

    /// Last observation day, YYYY-MM-DD
    #[arg(long, default_value = "2017-01-31")]
    end: NaiveDate,

    /// Station networks to list (comma separated). Defaults to AWOS plus every state's ASOS network
    #[arg(long = "networks", value_delimiter = ',')]
    networks: Vec<String>,

    /// Maximum concurrent station group downloads
    #[arg(long, env = "WXFLIGHTS_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    /// Per-group download deadline in seconds, 0 disables it
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Form body posted to the flights portal
    #[arg(long, env = "WXFLIGHTS_FLIGHTS_PAYLOAD", default_value = "modern-1-url.txt")]
    flights_payload: PathBuf,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let window = ObservationWindow::new(cli.start, cli.end)
        .with_context(|| format!("start {} is after end {}", cli.start, cli.end))?;
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_data_dir()?,
    };
    let networks = if cli.networks.is_empty() {
        default_networks()
    } else {
        cli.networks
    };
    let fetch_timeout = (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs));

    let config = PipelineConfig::builder()
        .data_dir(data_dir)
        .window(window)
        .networks(networks)
        .max_workers(cli.workers)
        .maybe_fetch_timeout(fetch_timeout)
        .target(cli.target)
        .flights_payload(cli.flights_payload)
        .show_progress(!cli.quiet)
        .build();
    info!(
        "Downloading {:?} for {} into {:?}",
        config.target, config.window, config.data_dir
    );

    let downloader = Downloader::new(config);
    let summary = downloader.download_all().await.context("Download failed")?;

    if let Some(weather) = &summary.weather {
        let store = downloader.layout().weather_store();
        if weather.from_store {
            println!("Weather: {} rows loaded from {}", weather.table.height(), store.display());
        } else {
            println!("Weather: {} rows written to {}", weather.table.height(), store.display());
        }
        for failure in &weather.failures {
            eprintln!("  {} failed: {}", failure.network, failure.error);
        }
    }
    if let Some(flights) = &summary.flights {
        println!(
            "Flights: {} rows in {}",
            flights.frame.height(),
            downloader.layout().flights_store().display()
        );
    }

    Ok(())
}
