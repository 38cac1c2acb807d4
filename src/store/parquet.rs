//! Parquet persistence for weather and flights tables.
//!
//! Writes go through a temporary file in the destination directory and are
//! renamed into place, so a table file is either complete or absent.

use crate::store::error::StoreError;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Writes a DataFrame to a Parquet file using spawn_blocking.
pub async fn write_parquet(mut df: DataFrame, path: &Path) -> Result<(), StoreError> {
    let path_buf = path.to_path_buf();
    let rows = df.height();
    task::spawn_blocking(move || {
        let dir = parent_dir(&path_buf);
        let mut temp_file = NamedTempFile::new_in(&dir)
            .map_err(|e| StoreError::ParquetWriteIo(path_buf.clone(), e))?;
        ParquetWriter::new(temp_file.as_file_mut())
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| StoreError::ParquetWritePolars(path_buf.clone(), e))?;
        temp_file
            .persist(&path_buf)
            .map_err(|e| StoreError::ParquetWriteIo(path_buf.clone(), e.error))?;
        Ok::<(), StoreError>(())
    })
    .await??;
    info!("Wrote {} rows to {:?}", rows, path);
    Ok(())
}

/// Reads a whole Parquet file into memory.
pub async fn read_parquet(path: &Path) -> Result<DataFrame, StoreError> {
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let file = std::fs::File::open(&path_buf)
            .map_err(|e| StoreError::ParquetReadIo(path_buf.clone(), e))?;
        ParquetReader::new(file)
            .finish()
            .map_err(|e| StoreError::ParquetRead(path_buf, e))
    })
    .await?
}

pub fn scan_parquet(path: &Path) -> Result<LazyFrame, StoreError> {
    LazyFrame::scan_parquet(path, Default::default())
        .map_err(|e| StoreError::ParquetRead(path.to_path_buf(), e))
}

pub async fn file_exists(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_frame() -> DataFrame {
        df!(
            "station" => ["AAA", "BBB"],
            "tmpf" => [Some(32.0), None],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn round_trips_through_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.parquet");

        write_parquet(sample_frame(), &path).await.unwrap();
        assert!(file_exists(&path).await);

        let df = read_parquet(&path).await.unwrap();
        assert!(df.equals_missing(&sample_frame()));
    }

    #[tokio::test]
    async fn leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.parquet");

        write_parquet(sample_frame(), &path).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.parquet");

        assert!(!file_exists(&path).await);
        let err = read_parquet(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::ParquetReadIo(p, _) if p == path));
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("table.parquet");

        let err = write_parquet(sample_frame(), &path).await.unwrap_err();
        assert!(matches!(err, StoreError::ParquetWriteIo(..)));
    }
}
