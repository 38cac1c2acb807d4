pub mod error;
pub mod layout;
pub mod parquet;

use crate::store::error::StoreError;
use log::info;
use std::io;
use std::path::Path;

pub use layout::DataLayout;

/// Creates `path` (and parents) unless it already is a directory.
pub async fn ensure_dir_exists(path: &Path) -> Result<(), StoreError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(StoreError::NotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| StoreError::DirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(StoreError::DirCreation(path.to_path_buf(), e)),
    }
}
