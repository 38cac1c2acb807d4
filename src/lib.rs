mod config;
mod downloader;
mod error;
mod flights;
mod progress;
mod stations;
mod store;
mod types;
mod utils;
mod weather_data;

pub use config::{DownloadTarget, PipelineConfig};
pub use downloader::{DownloadSummary, Downloader, WeatherDownload};
pub use error::PipelineError;
pub use progress::ProgressReporter;
pub use utils::get_data_dir;

pub use stations::directory::{parse_feature_collection, IemStationDirectory, StationDirectory};
pub use stations::error::DirectoryFetchError;
pub use stations::{default_networks, list_stations, AWOS_NETWORK, STATES};

pub use types::station::{group_by_network, Station, StationGroup};
pub use types::weather::{schema_column_names, WeatherRecord, WeatherTable};
pub use types::window::ObservationWindow;

pub use weather_data::coordinator::{
    CompletedGroup, FetchCoordinator, FetchReport, GroupFailure, GroupOutcome,
    DEFAULT_MAX_WORKERS,
};
pub use weather_data::error::WeatherDataError;
pub use weather_data::fetcher::WeatherFetcher;
pub use weather_data::merger::merge_groups;
pub use weather_data::parser::parse_observations;
pub use weather_data::source::{IemObservationSource, ObservationSource};

pub use store::error::StoreError;
pub use store::DataLayout;

pub use flights::error::FlightsError;
pub use flights::reader::normalize_flights;
pub use flights::source::{ArchiveSource, TranstatsArchive};
pub use flights::{download_flights, FlightsDownload};
