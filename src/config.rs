//! Run configuration for the download pipeline.

use crate::flights::source::DEFAULT_PAYLOAD_FILE;
use crate::stations::default_networks;
use crate::types::window::ObservationWindow;
use crate::weather_data::coordinator::DEFAULT_MAX_WORKERS;
use bon::Builder;
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Which datasets a run downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DownloadTarget {
    #[default]
    Weather,
    Flights,
    Both,
}

impl DownloadTarget {
    pub fn includes_weather(self) -> bool {
        matches!(self, DownloadTarget::Weather | DownloadTarget::Both)
    }

    pub fn includes_flights(self) -> bool {
        matches!(self, DownloadTarget::Flights | DownloadTarget::Both)
    }
}

/// Everything a [`Downloader`](crate::Downloader) needs besides its transports.
///
/// ```
/// use wxflights::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .data_dir("data")
///     .max_workers(4)
///     .build();
/// assert_eq!(config.networks.len(), 51);
/// assert!(config.fetch_timeout.is_none());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct PipelineConfig {
    /// Root of every persisted artifact.
    #[builder(into)]
    pub data_dir: PathBuf,
    #[builder(default)]
    pub window: ObservationWindow,
    /// Station networks to list, in listing order.
    #[builder(default = default_networks())]
    pub networks: Vec<String>,
    #[builder(default = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,
    pub fetch_timeout: Option<Duration>,
    #[builder(default)]
    pub target: DownloadTarget,
    /// Form body posted to the flights portal.
    #[builder(into, default = PathBuf::from(DEFAULT_PAYLOAD_FILE))]
    pub flights_payload: PathBuf,
    #[builder(default = true)]
    pub show_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn builder_fills_defaults() {
        let config = PipelineConfig::builder().data_dir("/tmp/wx").build();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/wx"));
        assert_eq!(config.window, ObservationWindow::default());
        assert_eq!(config.networks[0], "AWOS");
        assert_eq!(config.max_workers, 10);
        assert_eq!(config.fetch_timeout, None);
        assert_eq!(config.target, DownloadTarget::Weather);
        assert_eq!(config.flights_payload, PathBuf::from("modern-1-url.txt"));
        assert!(config.show_progress);
    }

    #[test]
    fn builder_overrides() {
        let window = ObservationWindow::new(
            NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 3, 2).unwrap(),
        )
        .unwrap();
        let config = PipelineConfig::builder()
            .data_dir("/tmp/wx")
            .window(window)
            .networks(vec!["IA_ASOS".to_string()])
            .fetch_timeout(Duration::from_secs(5))
            .target(DownloadTarget::Both)
            .show_progress(false)
            .build();

        assert_eq!(config.window, window);
        assert_eq!(config.networks, ["IA_ASOS"]);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(5)));
        assert!(config.target.includes_weather());
        assert!(config.target.includes_flights());
        assert!(!config.show_progress);
    }

    #[test]
    fn target_selection() {
        assert!(DownloadTarget::Weather.includes_weather());
        assert!(!DownloadTarget::Weather.includes_flights());
        assert!(DownloadTarget::Flights.includes_flights());
        assert!(!DownloadTarget::Flights.includes_weather());
    }
}
