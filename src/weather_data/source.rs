use crate::types::weather::requested_fields;
use crate::types::window::ObservationWindow;
use crate::weather_data::error::WeatherDataError;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder};

pub const OBSERVATION_URL: &str = "https://mesonet.agron.iastate.edu/cgi-bin/request/asos.py";

/// Transport for raw observation payloads: one request per station group.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Returns the comma-delimited, `#`-commented payload for `station_ids` over `window`.
    async fn fetch(
        &self,
        station_ids: &[String],
        window: &ObservationWindow,
    ) -> Result<String, WeatherDataError>;
}

#[async_trait]
impl<'a, T: ObservationSource + ?Sized> ObservationSource for &'a T {
    async fn fetch(
        &self,
        station_ids: &[String],
        window: &ObservationWindow,
    ) -> Result<String, WeatherDataError> {
        (**self).fetch(station_ids, window).await
    }
}

/// The IEM ASOS request script.
pub struct IemObservationSource {
    client: Client,
    base_url: String,
}

impl IemObservationSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OBSERVATION_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds the request for one group: every field and station is a repeated
    /// query parameter, timestamps are requested in UTC.
    pub fn request(&self, station_ids: &[String], window: &ObservationWindow) -> RequestBuilder {
        let mut query: Vec<(&str, String)> = requested_fields()
            .map(|field| ("data", field.to_string()))
            .collect();
        query.push(("tz", "Etc/UTC".to_string()));
        query.push(("format", "comma".to_string()));
        query.push(("latlon", "no".to_string()));
        query.extend(window.query_pairs());
        query.extend(station_ids.iter().map(|id| ("station", id.clone())));

        self.client.get(&self.base_url).query(&query)
    }
}

#[async_trait]
impl ObservationSource for IemObservationSource {
    async fn fetch(
        &self,
        station_ids: &[String],
        window: &ObservationWindow,
    ) -> Result<String, WeatherDataError> {
        let request = self
            .request(station_ids, window)
            .build()
            .map_err(|e| WeatherDataError::NetworkRequest(self.base_url.clone(), e))?;
        let url = request.url().to_string();
        debug!("Downloading observations from {}", url);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    WeatherDataError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    WeatherDataError::NetworkRequest(url, e)
                });
            }
        };

        let payload = response
            .text()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(url.clone(), e))?;
        info!(
            "Downloaded {} bytes of observations for {} stations",
            payload.len(),
            station_ids.len()
        );
        Ok(payload)
    }
}
