use std::collections::HashMap;
use std::sync::Arc;

use range_core::{GeoPoint, StationDirectory, StationRecord};
use range_engine::{
    FixedGeocoder, Geocoder, GeocoderError, NetworkDirectory, NominatimConfig, NominatimGeocoder,
    SearchSettings,
};
use serde::{Deserialize, Serialize};

/// Server configuration loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub geocoder: GeocoderSettings,
    /// Default radius and size of station searches
    pub search: SearchSettings,
    /// Seed of the local directory. Entries keep their own `verified` flag.
    pub verified_stations: Vec<StationRecord>,
    pub network_stations: Vec<StationRecord>,
}

/// Which geocoder resolves place names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeocoderSettings {
    Nominatim(NominatimConfig),
    /// Offline lookup table, keyed by place name
    Fixed {
        #[serde(default)]
        places: HashMap<String, GeoPoint>,
    },
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        GeocoderSettings::Nominatim(NominatimConfig::default())
    }
}

impl GeocoderSettings {
    pub fn build(&self) -> Result<Arc<dyn Geocoder>, GeocoderError> {
        match self {
            GeocoderSettings::Nominatim(config) => {
                Ok(Arc::new(NominatimGeocoder::new(config.clone())?))
            }
            GeocoderSettings::Fixed { places } => Ok(Arc::new(FixedGeocoder::new(
                places.iter().map(|(name, point)| (name.clone(), *point)),
            ))),
        }
    }
}

impl AppConfig {
    pub fn station_directory(&self) -> StationDirectory {
        StationDirectory::new(self.verified_stations.clone())
    }

    pub fn network_directory(&self) -> NetworkDirectory {
        NetworkDirectory::new(self.network_stations.clone())
    }
}
