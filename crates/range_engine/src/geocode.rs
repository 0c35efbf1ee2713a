//! Place name lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use range_core::GeoPoint;

/// Errors raised while talking to a geocoding provider.
#[derive(Debug, thiserror::Error)]
pub enum GeocoderError {
    /// HTTP request failed, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the provider response
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

/// Resolves a free-form place name to coordinates.
///
/// `Ok(None)` means the provider answered but knows no such place.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocoderError>;
}

/// Geocoder backed by a fixed table of places, for offline use.
#[derive(Debug, Clone, Default)]
pub struct FixedGeocoder {
    places: HashMap<String, GeoPoint>,
}

fn normalize(place: &str) -> String {
    place.trim().to_lowercase()
}

impl FixedGeocoder {
    pub fn new(places: impl IntoIterator<Item = (String, GeoPoint)>) -> Self {
        FixedGeocoder {
            places: places
                .into_iter()
                .map(|(name, point)| (normalize(&name), point))
                .collect(),
        }
    }

    pub fn with_place(mut self, name: &str, point: GeoPoint) -> Self {
        self.places.insert(normalize(name), point);
        self
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, GeocoderError> {
        Ok(self.places.get(&normalize(place)).copied())
    }
}
