use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryFetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse station directory for network '{network}'")]
    JsonParse {
        network: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Station directory for network '{network}' has a feature without an identifier")]
    MissingStationId { network: String },

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
