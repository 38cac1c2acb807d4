use crate::flights::error::FlightsError;
use crate::stations::error::DirectoryFetchError;
use crate::store::error::StoreError;
use crate::weather_data::coordinator::GroupFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Directory(#[from] DirectoryFetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Flights(#[from] FlightsError),

    #[error("Failed to determine data directory")]
    DataDirResolution,

    #[error("None of the station groups could be fetched ({} failed)", .0.len())]
    NoGroupsFetched(Vec<GroupFailure>),
}
