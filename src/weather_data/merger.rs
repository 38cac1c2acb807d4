use crate::store::error::StoreError;
use crate::store::parquet::{scan_parquet, write_parquet};
use crate::types::weather::WeatherTable;
use crate::weather_data::coordinator::CompletedGroup;
use crate::weather_data::parser::sort_unique_by_key;
use log::info;
use polars::prelude::*;
use std::path::Path;
use tokio::task;

/// Concatenates the intermediate files of `completed`, sorts the union by
/// `(station, date)` and writes it to `store_path`.
///
/// Only the listed files are read; anything else in the weather directory is
/// ignored. An empty `completed` set produces an empty table and no store file.
pub async fn merge_groups(
    completed: &[CompletedGroup],
    store_path: &Path,
) -> Result<WeatherTable, StoreError> {
    let frames = completed
        .iter()
        .map(|group| scan_parquet(&group.path))
        .collect::<Result<Vec<_>, _>>()?;

    if frames.is_empty() {
        return Ok(WeatherTable::new(DataFrame::empty()));
    }

    let merged = task::spawn_blocking(move || {
        let df = concat(frames, UnionArgs::default())?.collect()?;
        sort_unique_by_key(df)
    })
    .await?
    .map_err(StoreError::Merge)?;

    info!(
        "Merged {} station groups into {} rows",
        completed.len(),
        merged.height()
    );
    write_parquet(merged.clone(), store_path).await?;
    Ok(WeatherTable::new(merged))
}
