use crate::store::error::StoreError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlightsError {
    #[error("Failed to read request payload '{0}'")]
    PayloadRead(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error while downloading to '{0}'")]
    DownloadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to open archive '{0}'")]
    Archive(PathBuf, #[source] zip::result::ZipError),

    #[error("Archive '{0}' has no members")]
    EmptyArchive(PathBuf),

    #[error("Failed to extract '{member}' to '{path}'")]
    Extract {
        member: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read flights CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Missing required column '{0}' in flights data")]
    MissingColumn(String),

    #[error("Polars operation failed on flights data")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
