//! Monthly on-time performance records.
//!
//! One form POST yields a zipped CSV. Each stage is cached on disk: the
//! normalized `flights.parquet` short-circuits everything, otherwise an
//! existing archive or extracted CSV skips the download.

pub mod error;
pub mod reader;
pub mod source;

use crate::flights::error::FlightsError;
use crate::flights::reader::{extract_first_member, first_member_name, read_flights};
use crate::flights::source::ArchiveSource;
use crate::store::parquet::{file_exists, read_parquet, write_parquet};
use crate::store::{ensure_dir_exists, DataLayout};
use log::{info, warn};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tokio::task;

#[derive(Debug, Clone)]
pub struct FlightsDownload {
    pub frame: DataFrame,
    /// `true` when the table was loaded from `flights.parquet`.
    pub from_store: bool,
}

/// Produces the normalized flights table, downloading only what is missing.
pub async fn download_flights<A: ArchiveSource + ?Sized>(
    source: &A,
    layout: &DataLayout,
) -> Result<FlightsDownload, FlightsError> {
    let store_path = layout.flights_store();
    if file_exists(&store_path).await {
        info!("Cache hit for flights table at {:?}", store_path);
        let frame = read_parquet(&store_path).await?;
        return Ok(FlightsDownload {
            frame,
            from_store: true,
        });
    }

    ensure_dir_exists(layout.root()).await?;
    let csv_path = locate_csv(source, layout).await?;

    let frame = task::spawn_blocking(move || read_flights(&csv_path)).await??;
    write_parquet(frame.clone(), &store_path).await?;
    Ok(FlightsDownload {
        frame,
        from_store: false,
    })
}

/// Path of the extracted CSV, downloading and extracting as needed.
async fn locate_csv<A: ArchiveSource + ?Sized>(
    source: &A,
    layout: &DataLayout,
) -> Result<PathBuf, FlightsError> {
    let zip_path = layout.flights_zip();

    if !file_exists(&zip_path).await {
        if let Some(csv_path) = find_extracted_csv(layout.root()).await {
            info!("Using previously extracted {:?}", csv_path);
            return Ok(csv_path);
        }
        warn!("No flights archive at {:?}. Downloading.", zip_path);
        source.download_to(&zip_path).await?;
    }

    let zip_owned = zip_path.clone();
    let member = task::spawn_blocking(move || first_member_name(&zip_owned)).await??;
    let csv_path = layout.flights_csv(&member);
    if file_exists(&csv_path).await {
        info!("Archive member already extracted at {:?}", csv_path);
        return Ok(csv_path);
    }

    task::spawn_blocking(move || extract_first_member(&zip_path, &csv_path)).await?
}

/// First `.csv` file directly under `root`, by name.
async fn find_extracted_csv(root: &Path) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(root).await.ok()?;
    let mut candidates = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polars::prelude::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use ::zip::write::FileOptions;
    use ::zip::{CompressionMethod, ZipWriter};

    const CSV: &str = "\
FL_DATE,UNIQUE_CARRIER,TAIL_NUM,ORIGIN,ORIGIN_CITY_NAME,DEST,DEST_CITY_NAME,DEP_TIME,ARR_TIME,CANCELLATION_CODE,
2017-01-01,AA,N787AA,JFK,\"New York, NY\",LAX,\"Los Angeles, CA\",914,1200,,
";

    fn zip_bytes() -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut archive = ZipWriter::new(&mut buffer);
            archive
                .start_file(
                    "On_Time_2017_1.csv",
                    FileOptions::default().compression_method(CompressionMethod::Stored),
                )
                .unwrap();
            archive.write_all(CSV.as_bytes()).unwrap();
            archive.finish().unwrap();
        }
        buffer.into_inner()
    }

    /// Serves a canned archive and counts downloads.
    #[derive(Default)]
    struct CannedArchive {
        downloads: AtomicUsize,
    }

    #[async_trait]
    impl ArchiveSource for CannedArchive {
        async fn download_to(&self, dest: &Path) -> Result<u64, FlightsError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let bytes = zip_bytes();
            tokio::fs::write(dest, &bytes)
                .await
                .map_err(|e| FlightsError::DownloadIo(dest.to_path_buf(), e))?;
            Ok(bytes.len() as u64)
        }
    }

    #[tokio::test]
    async fn downloads_extracts_and_stores() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path().join("data"));
        let source = CannedArchive::default();

        let first = download_flights(&source, &layout).await.unwrap();
        assert!(!first.from_store);
        assert_eq!(first.frame.height(), 1);
        assert!(layout.flights_zip().exists());
        assert!(layout.flights_csv("On_Time_2017_1.csv").exists());
        assert!(layout.flights_store().exists());

        let second = download_flights(&source, &layout).await.unwrap();
        assert!(second.from_store);
        assert_eq!(second.frame.height(), 1);
        assert_eq!(
            second.frame.column("dep_time").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(source.downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_archive_skips_download() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        std::fs::write(layout.flights_zip(), zip_bytes()).unwrap();
        let source = CannedArchive::default();

        let result = download_flights(&source, &layout).await.unwrap();
        assert_eq!(result.frame.height(), 1);
        assert_eq!(source.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extracted_csv_skips_download() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        std::fs::write(dir.path().join("On_Time_2017_1.csv"), CSV).unwrap();
        let source = CannedArchive::default();

        let result = download_flights(&source, &layout).await.unwrap();
        let origin = result.frame.column("origin_city_name").unwrap().str().unwrap();
        assert_eq!(origin.get(0), Some("New York"));
        assert_eq!(source.downloads.load(Ordering::SeqCst), 0);
    }
}
