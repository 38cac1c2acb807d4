//! Station listings from the IEM network directory.
//!
//! Each network is served as a GeoJSON feature collection whose feature ids
//! are the station identifiers accepted by the observation service.

use crate::stations::error::DirectoryFetchError;
use crate::types::station::Station;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

pub const DIRECTORY_URL: &str = "https://mesonet.agron.iastate.edu/geojson/network.php";

/// Lists the stations of one observation network.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn stations(&self, network: &str) -> Result<Vec<Station>, DirectoryFetchError>;
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    properties: FeatureProperties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize, Default)]
struct FeatureProperties {
    sid: Option<String>,
    sname: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Value,
}

impl Feature {
    fn station_id(&self) -> Option<String> {
        match &self.id {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => self.properties.sid.clone(),
        }
    }

    /// GeoJSON points are `[longitude, latitude]`.
    fn lat_lon(&self) -> (Option<f64>, Option<f64>) {
        let Some(Value::Array(coords)) = self.geometry.as_ref().map(|g| &g.coordinates) else {
            return (None, None);
        };
        match (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => (Some(lat), Some(lon)),
            _ => (None, None),
        }
    }
}

/// Parses a GeoJSON directory payload, tagging every station with `network`.
pub fn parse_feature_collection(
    network: &str,
    bytes: &[u8],
) -> Result<Vec<Station>, DirectoryFetchError> {
    let collection: FeatureCollection =
        serde_json::from_slice(bytes).map_err(|e| DirectoryFetchError::JsonParse {
            network: network.to_string(),
            source: e,
        })?;

    collection
        .features
        .into_iter()
        .map(|feature| {
            let id = feature
                .station_id()
                .ok_or_else(|| DirectoryFetchError::MissingStationId {
                    network: network.to_string(),
                })?;
            let (latitude, longitude) = feature.lat_lon();
            Ok(Station {
                id,
                network: network.to_string(),
                name: feature.properties.sname,
                latitude,
                longitude,
            })
        })
        .collect()
}

/// The live IEM directory service.
pub struct IemStationDirectory {
    client: Client,
    base_url: String,
}

impl IemStationDirectory {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DIRECTORY_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StationDirectory for IemStationDirectory {
    async fn stations(&self, network: &str) -> Result<Vec<Station>, DirectoryFetchError> {
        let url = format!("{}?network={}", self.base_url, network);
        debug!("Fetching station directory from {}", url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("network", network)])
            .send()
            .await
            .map_err(|e| DirectoryFetchError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    DirectoryFetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    DirectoryFetchError::NetworkRequest(url, e)
                });
            }
        };

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DirectoryFetchError::NetworkRequest(url.clone(), e))?;

        let network_owned = network.to_string();
        let stations = tokio::task::spawn_blocking(move || {
            parse_feature_collection(&network_owned, &bytes)
        })
        .await??;

        info!("Network {} lists {} stations", network, stations.len());
        Ok(stations)
    }
}

// -- Tests -------------------------------------------------------------------
