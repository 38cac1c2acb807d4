//! Retrieval of the on-time performance archive.

use crate::flights::error::FlightsError;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

pub const DOWNLOAD_URL: &str = "https://www.transtats.bts.gov/DownLoad_Table.asp";
pub const DEFAULT_PAYLOAD_FILE: &str = "modern-1-url.txt";

const PORTAL_ORIGIN: &str = "https://www.transtats.bts.gov";
const PORTAL_REFERER: &str =
    "https://www.transtats.bts.gov/DL_SelectFields.asp?Table_ID=236&DB_Short_Name=On-Time";
const TABLE_QUERY: [(&str, &str); 3] = [("Table_ID", "236"), ("Has_Group", "3"), ("Is_Zipped", "0")];

/// Produces the zipped flights CSV at a given path.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Writes the archive to `dest` and returns its size in bytes. `dest` is
    /// left untouched on failure.
    async fn download_to(&self, dest: &Path) -> Result<u64, FlightsError>;
}

/// The BTS TranStats download form.
pub struct TranstatsArchive {
    client: Client,
    url: String,
    payload_path: PathBuf,
}

impl TranstatsArchive {
    pub fn new(client: Client, payload_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            url: DOWNLOAD_URL.to_string(),
            payload_path: payload_path.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// The form POST carrying `body`, with the headers the portal checks.
    pub fn request(&self, body: String) -> RequestBuilder {
        self.client
            .post(&self.url)
            .query(&TABLE_QUERY)
            .header(REFERER, PORTAL_REFERER)
            .header(ORIGIN, PORTAL_ORIGIN)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
    }

    async fn read_payload(&self) -> Result<String, FlightsError> {
        let payload = tokio::fs::read_to_string(&self.payload_path)
            .await
            .map_err(|e| FlightsError::PayloadRead(self.payload_path.clone(), e))?;
        Ok(payload.trim().to_string())
    }
}

#[async_trait]
impl ArchiveSource for TranstatsArchive {
    async fn download_to(&self, dest: &Path) -> Result<u64, FlightsError> {
        let body = self.read_payload().await?;
        debug!("Posting {} byte form to {}", body.len(), self.url);

        let response = self
            .request(body)
            .send()
            .await
            .map_err(|e| FlightsError::NetworkRequest(self.url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.url, e);
                return Err(if let Some(status) = e.status() {
                    FlightsError::HttpStatus {
                        url: self.url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    FlightsError::NetworkRequest(self.url.clone(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);

        let io_err = |e| FlightsError::DownloadIo(dest.to_path_buf(), e);
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let temp_file = NamedTempFile::new_in(dir).map_err(io_err)?;
        let mut file = tokio::fs::File::from_std(temp_file.reopen().map_err(io_err)?);

        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        drop(file);

        temp_file.persist(dest).map_err(|e| io_err(e.error))?;
        info!("Downloaded {} bytes to {:?}", written, dest);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn request_carries_portal_headers_and_query() {
        let archive = TranstatsArchive::new(Client::new(), DEFAULT_PAYLOAD_FILE);
        let request = archive
            .request("UserTableName=On_Time_Performance".to_string())
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/DownLoad_Table.asp");
        let query: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            [
                ("Table_ID".to_string(), "236".to_string()),
                ("Has_Group".to_string(), "3".to_string()),
                ("Is_Zipped".to_string(), "0".to_string()),
            ]
        );

        let headers = request.headers();
        assert_eq!(headers[REFERER], PORTAL_REFERER);
        assert_eq!(headers[ORIGIN], PORTAL_ORIGIN);
        assert_eq!(headers[CONTENT_TYPE], "application/x-www-form-urlencoded");
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(&b"UserTableName=On_Time_Performance"[..])
        );
    }

    #[tokio::test]
    async fn payload_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let payload = dir.path().join("form.txt");
        std::fs::write(&payload, "  a=1&b=2\n\n").unwrap();

        let archive = TranstatsArchive::new(Client::new(), &payload);
        assert_eq!(archive.read_payload().await.unwrap(), "a=1&b=2");
    }

    #[tokio::test]
    async fn missing_payload_fails_before_any_request() {
        let dir = TempDir::new().unwrap();
        let archive = TranstatsArchive::new(Client::new(), dir.path().join("absent.txt"))
            .with_url("http://127.0.0.1:9/DownLoad_Table.asp");

        let dest = dir.path().join("flights.csv.zip");
        let err = archive.download_to(&dest).await.unwrap_err();
        assert!(matches!(err, FlightsError::PayloadRead(..)));
        assert!(!dest.exists());
    }
}
