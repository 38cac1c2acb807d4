//! Defines the data structures representing IEM observation stations and the
//! per-network groups that partition the weather download into units of work.

use std::collections::{BTreeMap, HashSet};

// --- Data Structures ---

/// Represents a single observation station as listed by the IEM network directory.
///
/// Every station is tagged with the network it was queried under, which is also
/// the key used to group stations into concurrent fetch tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// The station identifier used by the observation service (e.g., "AMW", "DSM").
    pub id: String,
    /// The network the station was listed under (e.g., "IA_ASOS", "AWOS").
    pub network: String,
    /// The human readable station name, if the directory provides one.
    pub name: Option<String>,
    /// Latitude in decimal degrees, if the directory provides a point geometry.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if the directory provides a point geometry.
    pub longitude: Option<f64>,
}

/// All station identifiers belonging to one observation network.
///
/// A `StationGroup` is the unit of work for one weather fetch task. Station
/// identifiers keep the order in which the directory listed them, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationGroup {
    /// The network key, used both as the remote query key and as the intermediate file name.
    pub network: String,
    /// Member station identifiers, in directory order.
    pub station_ids: Vec<String>,
}

impl StationGroup {
    pub fn new(network: impl Into<String>, station_ids: Vec<String>) -> Self {
        Self {
            network: network.into(),
            station_ids,
        }
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.station_ids.iter().any(|id| id == station_id)
    }

    pub fn len(&self) -> usize {
        self.station_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.station_ids.is_empty()
    }
}

/// Groups a flat station listing by network.
///
/// Groups come out ordered by network name. Networks without stations never
/// produce a group, since they are only discovered through their members.
pub fn group_by_network(stations: Vec<Station>) -> Vec<StationGroup> {
    let mut groups: BTreeMap<String, (Vec<String>, HashSet<String>)> = BTreeMap::new();

    for station in stations {
        let (ids, seen) = groups.entry(station.network).or_default();
        if seen.insert(station.id.clone()) {
            ids.push(station.id);
        }
    }

    groups
        .into_iter()
        .map(|(network, (station_ids, _))| StationGroup::new(network, station_ids))
        .collect()
}

// -- Tests -------------------------------------------------------------------
