use crate::types::station::StationGroup;
use crate::types::weather::STATION;
use crate::types::window::ObservationWindow;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::parser::parse_observations;
use crate::weather_data::source::ObservationSource;
use log::{debug, warn};
use polars::prelude::*;
use std::collections::HashSet;
use tokio::task;

/// Fetches and normalizes the observations of one station group.
pub struct WeatherFetcher<S> {
    source: S,
    window: ObservationWindow,
}

impl<S: ObservationSource> WeatherFetcher<S> {
    pub fn new(source: S, window: ObservationWindow) -> Self {
        Self { source, window }
    }

    pub fn window(&self) -> &ObservationWindow {
        &self.window
    }

    /// Issues one request for every station of `group` and returns the parsed
    /// table. Rows for stations outside the group are discarded.
    pub async fn fetch_group(&self, group: &StationGroup) -> Result<DataFrame, WeatherDataError> {
        debug!(
            "Fetching {} stations of network {} for {}",
            group.len(),
            group.network,
            self.window
        );
        let payload = self.source.fetch(&group.station_ids, &self.window).await?;

        let group = group.clone();
        task::spawn_blocking(move || {
            let df = parse_observations(&payload, &group.network)?;
            retain_members(df, &group)
        })
        .await?
    }
}

fn retain_members(df: DataFrame, group: &StationGroup) -> Result<DataFrame, WeatherDataError> {
    let polars_err = |source| WeatherDataError::PolarsError {
        group: group.network.clone(),
        source,
    };
    let members: HashSet<&str> = group.station_ids.iter().map(String::as_str).collect();

    let mask: BooleanChunked = df
        .column(STATION)
        .and_then(|c| c.str())
        .map_err(polars_err)?
        .into_iter()
        .map(|station| Some(station.is_some_and(|s| members.contains(s))))
        .collect();

    let kept = df.filter(&mask).map_err(polars_err)?;
    if kept.height() < df.height() {
        warn!(
            "Dropped {} rows for stations outside network {}",
            df.height() - kept.height(),
            group.network
        );
    }
    Ok(kept)
}
