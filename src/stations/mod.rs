pub mod directory;
pub mod error;

use crate::progress::ProgressReporter;
use crate::stations::directory::StationDirectory;
use crate::stations::error::DirectoryFetchError;
use crate::types::station::Station;

/// US state codes with an `<ST>_ASOS` network.
pub const STATES: [&str; 50] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH",
    "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA",
    "VT", "WA", "WI", "WV", "WY",
];

/// Iowa AWOS sites are listed in their own network rather than under IA_ASOS.
pub const AWOS_NETWORK: &str = "AWOS";

/// `AWOS` followed by one ASOS network per state.
pub fn default_networks() -> Vec<String> {
    std::iter::once(AWOS_NETWORK.to_string())
        .chain(STATES.iter().map(|state| format!("{}_ASOS", state)))
        .collect()
}

/// Lists every network in turn and concatenates the results.
///
/// The first failing network aborts the listing: stations cannot be grouped
/// from a partial directory.
pub async fn list_stations<D: StationDirectory + ?Sized>(
    directory: &D,
    networks: &[String],
    progress: &ProgressReporter,
) -> Result<Vec<Station>, DirectoryFetchError> {
    let mut stations = Vec::new();

    for network in networks {
        progress.set_message(&format!("Listing stations for {}", network));
        stations.extend(directory.stations(network).await?);
        progress.increment(1);
    }

    progress.finish_with_message(&format!(
        "Listed {} stations in {} networks",
        stations.len(),
        networks.len()
    ));
    Ok(stations)
}
