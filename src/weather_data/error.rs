use polars::error::PolarsError;
use std::time::Duration;
use thiserror::Error;

/// Failure to fetch or parse one station group's observations.
///
/// These never abort a run: the coordinator records them against the group's
/// network and carries on with the remaining groups.
#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Observation source failed: {0}")]
    Source(String),

    #[error("No observation rows in payload for '{group}'")]
    EmptyPayload { group: String },

    // Errors during CSV reading (inside blocking task)
    #[error("Parsing error processing CSV data for '{group}'")]
    CsvReadPolars {
        group: String,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' for '{group}'")]
    MissingColumnError { group: String, column: String },

    #[error("Unparseable timestamp '{value}' for '{group}'")]
    TimestampParse { group: String, value: String },

    #[error("Polars operation failed for '{group}': {source}")]
    PolarsError {
        group: String,
        #[source]
        source: PolarsError,
    },

    #[error("Fetch did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
