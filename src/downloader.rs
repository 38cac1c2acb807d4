//! The entry point that wires station listing, concurrent weather fetching,
//! merging and the flights download into one client.

use crate::config::{DownloadTarget, PipelineConfig};
use crate::error::PipelineError;
use crate::flights::source::{ArchiveSource, TranstatsArchive};
use crate::flights::{download_flights, FlightsDownload};
use crate::progress::ProgressReporter;
use crate::stations::directory::{IemStationDirectory, StationDirectory};
use crate::stations::list_stations;
use crate::store::parquet::{file_exists, read_parquet};
use crate::store::{ensure_dir_exists, DataLayout};
use crate::types::station::group_by_network;
use crate::types::weather::WeatherTable;
use crate::utils::get_data_dir;
use crate::weather_data::coordinator::{FetchCoordinator, GroupFailure};
use crate::weather_data::fetcher::WeatherFetcher;
use crate::weather_data::merger::merge_groups;
use crate::weather_data::source::{IemObservationSource, ObservationSource};
use log::{info, warn};
use reqwest::Client;

/// Result of [`Downloader::download_weather`].
#[derive(Debug)]
pub struct WeatherDownload {
    pub table: WeatherTable,
    /// Groups that could not be fetched. Their stations are absent from `table`.
    pub failures: Vec<GroupFailure>,
    /// `true` when the table was loaded from `weather.parquet` without any network call.
    pub from_store: bool,
}

/// Result of [`Downloader::download_all`]. A dataset is `None` when the
/// configured [`DownloadTarget`] excludes it.
#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub weather: Option<WeatherDownload>,
    pub flights: Option<FlightsDownload>,
}

/// Downloads the weather and flights datasets into a data directory.
///
/// Every artifact is cached under [`PipelineConfig::data_dir`]; once the final
/// `weather.parquet` or `flights.parquet` exists, later runs load it and make
/// no network calls for that dataset.
///
/// # Examples
///
/// ```no_run
/// # use wxflights::{Downloader, PipelineConfig, PipelineError};
/// # async fn run() -> Result<(), PipelineError> {
/// let config = PipelineConfig::builder()
///     .data_dir("data")
///     .networks(vec!["IA_ASOS".to_string()])
///     .build();
/// let downloader = Downloader::new(config);
///
/// let weather = downloader.download_weather().await?;
/// println!("{} observations", weather.table.height());
/// for failure in &weather.failures {
///     eprintln!("{} failed: {}", failure.network, failure.error);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Downloader<D = IemStationDirectory, S = IemObservationSource, A = TranstatsArchive> {
    config: PipelineConfig,
    layout: DataLayout,
    directory: D,
    source: S,
    archive: A,
}

impl Downloader {
    /// A downloader talking to the live IEM and TranStats services.
    pub fn new(config: PipelineConfig) -> Self {
        let client = Client::new();
        let archive = TranstatsArchive::new(client.clone(), &config.flights_payload);
        Self::with_sources(
            config,
            IemStationDirectory::new(client.clone()),
            IemObservationSource::new(client),
            archive,
        )
    }

    /// [`Downloader::new`] with every setting at its default and the data
    /// directory under the platform's local data directory.
    pub fn with_default_data_dir() -> Result<Self, PipelineError> {
        let data_dir = get_data_dir()?;
        Ok(Self::new(PipelineConfig::builder().data_dir(data_dir).build()))
    }
}

impl<D, S, A> Downloader<D, S, A>
where
    D: StationDirectory,
    S: ObservationSource,
    A: ArchiveSource,
{
    pub fn with_sources(config: PipelineConfig, directory: D, source: S, archive: A) -> Self {
        let layout = DataLayout::new(&config.data_dir);
        Self {
            config,
            layout,
            directory,
            source,
            archive,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Produces the merged weather table.
    ///
    /// Lists every configured network, fetches one group per network with at
    /// most `max_workers` requests in flight, and merges the groups that
    /// succeeded. Groups that fail are returned in
    /// [`WeatherDownload::failures`] rather than aborting the run.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::Directory`] if any network listing fails.
    /// * [`PipelineError::NoGroupsFetched`] if not a single group succeeded;
    ///   no `weather.parquet` is written in that case.
    /// * [`PipelineError::Store`] if an intermediate or final file cannot be
    ///   written or read.
    pub async fn download_weather(&self) -> Result<WeatherDownload, PipelineError> {
        let store_path = self.layout.weather_store();
        if file_exists(&store_path).await {
            info!("Cache hit for weather table at {:?}", store_path);
            let frame = read_parquet(&store_path).await?;
            return Ok(WeatherDownload {
                table: WeatherTable::new(frame),
                failures: Vec::new(),
                from_store: true,
            });
        }
        warn!("Cache miss for weather table at {:?}. Downloading.", store_path);
        ensure_dir_exists(self.layout.root()).await?;

        let silent = !self.config.show_progress;
        let listing = ProgressReporter::new(
            self.config.networks.len() as u64,
            "Listing stations",
            silent,
        );
        let stations = list_stations(&self.directory, &self.config.networks, &listing).await?;
        let groups = group_by_network(stations);

        let progress = ProgressReporter::new(groups.len() as u64, "Downloading", silent);
        let coordinator = FetchCoordinator::new(
            WeatherFetcher::new(&self.source, self.config.window),
            self.layout.clone(),
        )
        .with_max_workers(self.config.max_workers)
        .with_fetch_timeout(self.config.fetch_timeout);
        let report = coordinator.run(groups, &progress).await?;

        if report.completed.is_empty() {
            return Err(PipelineError::NoGroupsFetched(report.failures));
        }
        if !report.failures.is_empty() {
            warn!(
                "{} station groups failed: {}",
                report.failures.len(),
                report.failed_networks().join(", ")
            );
        }

        let table = merge_groups(&report.completed, &store_path).await?;
        Ok(WeatherDownload {
            table,
            failures: report.failures,
            from_store: false,
        })
    }

    /// Produces the normalized flights table. See [`download_flights`].
    pub async fn download_flights(&self) -> Result<FlightsDownload, PipelineError> {
        let spinner =
            ProgressReporter::new_spinner("Downloading flights", !self.config.show_progress);
        let flights = download_flights(&self.archive, &self.layout).await?;
        spinner.finish_with_message(&format!(
            "Flights table has {} rows",
            flights.frame.height()
        ));
        Ok(flights)
    }

    /// Runs the datasets selected by [`PipelineConfig::target`], weather first.
    pub async fn download_all(&self) -> Result<DownloadSummary, PipelineError> {
        let target: DownloadTarget = self.config.target;
        let mut summary = DownloadSummary::default();
        if target.includes_weather() {
            summary.weather = Some(self.download_weather().await?);
        }
        if target.includes_flights() {
            summary.flights = Some(self.download_flights().await?);
        }
        Ok(summary)
    }
}
