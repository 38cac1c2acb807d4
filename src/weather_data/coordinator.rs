//! Concurrent fetching of every station group.
//!
//! At most `max_workers` groups are in flight at once. Each finished group is
//! persisted to its own intermediate Parquet file before it is reported as
//! completed. A group that fails to fetch or parse is recorded and skipped;
//! the rest of the batch continues. The run returns only once every group has
//! settled.

use crate::progress::ProgressReporter;
use crate::store::error::StoreError;
use crate::store::parquet::write_parquet;
use crate::store::{ensure_dir_exists, DataLayout};
use crate::types::station::StationGroup;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::fetcher::WeatherFetcher;
use crate::weather_data::source::ObservationSource;
use futures_util::{stream, StreamExt};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_WORKERS: usize = 10;

/// A group whose observations were persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedGroup {
    pub network: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// A group whose fetch or parse failed.
#[derive(Debug)]
pub struct GroupFailure {
    pub network: String,
    pub error: WeatherDataError,
}

#[derive(Debug)]
pub enum GroupOutcome {
    Fetched(CompletedGroup),
    Failed(GroupFailure),
}

/// Settled outcomes of one coordinator run, ordered by network.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub completed: Vec<CompletedGroup>,
    pub failures: Vec<GroupFailure>,
}

impl FetchReport {
    pub fn failed_networks(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.network.as_str()).collect()
    }
}

pub struct FetchCoordinator<S> {
    fetcher: WeatherFetcher<S>,
    layout: DataLayout,
    max_workers: usize,
    fetch_timeout: Option<Duration>,
}

impl<S: ObservationSource> FetchCoordinator<S> {
    pub fn new(fetcher: WeatherFetcher<S>, layout: DataLayout) -> Self {
        Self {
            fetcher,
            layout,
            max_workers: DEFAULT_MAX_WORKERS,
            fetch_timeout: None,
        }
    }

    /// Upper bound on concurrently running fetches. Zero is treated as one.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Per-group deadline. An expired group fails with [`WeatherDataError::Timeout`].
    pub fn with_fetch_timeout(mut self, fetch_timeout: Option<Duration>) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetches every group and waits for all of them.
    ///
    /// Fetch failures are collected into the report. A failure to persist an
    /// intermediate file is returned as an error, after the remaining groups
    /// have drained.
    pub async fn run(
        &self,
        groups: Vec<StationGroup>,
        progress: &ProgressReporter,
    ) -> Result<FetchReport, StoreError> {
        ensure_dir_exists(&self.layout.weather_dir()).await?;
        info!(
            "Fetching {} station groups with up to {} workers",
            groups.len(),
            self.max_workers
        );

        let outcomes: Vec<Result<GroupOutcome, StoreError>> = stream::iter(groups)
            .map(|group| self.run_group(group))
            .buffer_unordered(self.max_workers)
            .inspect(|_| progress.increment(1))
            .collect()
            .await;

        let mut report = FetchReport::default();
        let mut persist_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(GroupOutcome::Fetched(completed)) => report.completed.push(completed),
                Ok(GroupOutcome::Failed(failure)) => report.failures.push(failure),
                Err(e) => {
                    error!("Failed to persist station group: {}", e);
                    persist_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = persist_error {
            return Err(e);
        }

        report.completed.sort_by(|a, b| a.network.cmp(&b.network));
        report.failures.sort_by(|a, b| a.network.cmp(&b.network));
        progress.finish_with_message(&format!(
            "Fetched {} station groups, {} failed",
            report.completed.len(),
            report.failures.len()
        ));
        Ok(report)
    }

    async fn run_group(&self, group: StationGroup) -> Result<GroupOutcome, StoreError> {
        let fetched = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch_group(&group))
                .await
                .unwrap_or(Err(WeatherDataError::Timeout(limit))),
            None => self.fetcher.fetch_group(&group).await,
        };

        let df = match fetched {
            Ok(df) => df,
            Err(error) => {
                warn!("Station group {} failed: {}", group.network, error);
                return Ok(GroupOutcome::Failed(GroupFailure {
                    network: group.network,
                    error,
                }));
            }
        };

        let path = self.layout.group_path(&group.network);
        let rows = df.height();
        write_parquet(df, &path).await?;
        Ok(GroupOutcome::Fetched(CompletedGroup {
            network: group.network,
            path,
            rows,
        }))
    }
}
