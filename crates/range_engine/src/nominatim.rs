//! OpenStreetMap Nominatim geocoding client.

use async_trait::async_trait;
use range_core::GeoPoint;
use serde::{Deserialize, Serialize};

use crate::geocode::{Geocoder, GeocoderError};

/// Default base URL of the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim rejects requests without an identifying user agent.
const DEFAULT_USER_AGENT: &str = "ev-range-planner/0.1";

/// Minimal DTO for a search hit - coordinates come back as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Configuration for the Nominatim client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NominatimConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Value of the User-Agent header
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl NominatimConfig {
    /// Set a custom base URL (for testing or a self-hosted instance).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Geocoder backed by the Nominatim `search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocoderError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Take the first hit of a search response, if any.
fn parse_search_response(body: &str) -> Result<Option<GeoPoint>, GeocoderError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body).map_err(|e| GeocoderError::Json {
        message: e.to_string(),
    })?;

    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };

    let coordinate = |raw: &str| {
        raw.trim().parse::<f64>().map_err(|e| GeocoderError::Json {
            message: format!("invalid coordinate {raw:?}: {e}"),
        })
    };

    Ok(Some(GeoPoint {
        latitude: coordinate(&hit.lat)?,
        longitude: coordinate(&hit.lon)?,
    }))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocoderError> {
        let url = format!("{}/search", self.base_url);
        tracing::debug!("Geocoding {:?}", place);

        let response = self
            .http
            .get(&url)
            .query(&[("format", "json"), ("q", place), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocoderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}
