//! Station sources the planner can draw candidates from.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use range_core::{StationDirectory, StationRecord, StationSourceKind, calculator::round1};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source could not produce a listing right now.
    #[error("{kind} station source unavailable: {message}")]
    Unavailable {
        kind: StationSourceKind,
        message: String,
    },
}

/// Case-insensitive substring filters on a station listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationFilters {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl StationFilters {
    pub fn matches(&self, station: &StationRecord) -> bool {
        let city = self
            .city
            .as_deref()
            .is_none_or(|city| contains_ignore_case(&station.city, city));
        let state = self
            .state
            .as_deref()
            .is_none_or(|state| contains_ignore_case(&station.state, state));
        let network = self.network.as_deref().is_none_or(|network| {
            station
                .network
                .as_deref()
                .is_some_and(|n| contains_ignore_case(n, network))
        });
        city && state && network
    }
}

/// A named collection of charging stations.
#[async_trait]
pub trait StationSource: Send + Sync {
    fn kind(&self) -> StationSourceKind;

    async fn list_stations(
        &self,
        filters: &StationFilters,
    ) -> Result<Vec<StationRecord>, SourceError>;
}

/// The local directory, shared with the HTTP layer. Only verified stations
/// are listed.
#[derive(Debug, Clone, Default)]
pub struct VerifiedDirectory {
    directory: Arc<Mutex<StationDirectory>>,
}

impl VerifiedDirectory {
    pub fn new(directory: StationDirectory) -> Self {
        VerifiedDirectory {
            directory: Arc::new(Mutex::new(directory)),
        }
    }

    /// Handle on the underlying directory for management operations.
    pub fn shared(&self) -> Arc<Mutex<StationDirectory>> {
        self.directory.clone()
    }
}

#[async_trait]
impl StationSource for VerifiedDirectory {
    fn kind(&self) -> StationSourceKind {
        StationSourceKind::Verified
    }

    async fn list_stations(
        &self,
        filters: &StationFilters,
    ) -> Result<Vec<StationRecord>, SourceError> {
        let directory = self.directory.lock().map_err(|e| SourceError::Unavailable {
            kind: StationSourceKind::Verified,
            message: e.to_string(),
        })?;
        Ok(directory
            .verified_stations()
            .into_iter()
            .filter(|s| filters.matches(s))
            .collect())
    }
}

/// Aggregate figures over the network listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
    pub total_stations: usize,
    pub total_networks: usize,
    pub networks: Vec<String>,
    pub cities: usize,
    pub states: usize,
    pub total_power: f64,
    pub average_power: f64,
}

/// Stations published by external charging networks.
#[derive(Debug, Clone, Default)]
pub struct NetworkDirectory {
    stations: Vec<StationRecord>,
}

impl NetworkDirectory {
    /// Network stations count as verified by construction.
    pub fn new(stations: Vec<StationRecord>) -> Self {
        let stations = stations
            .into_iter()
            .map(|mut station| {
                station.verified = true;
                station
            })
            .collect();
        NetworkDirectory { stations }
    }

    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    pub fn get(&self, station_id: &str) -> Option<&StationRecord> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    pub fn filtered(&self, filters: &StationFilters) -> Vec<StationRecord> {
        self.stations
            .iter()
            .filter(|s| filters.matches(s))
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> NetworkSummary {
        let mut networks = Vec::new();
        for network in self.stations.iter().filter_map(|s| s.network.as_ref()) {
            if !networks.contains(network) {
                networks.push(network.clone());
            }
        }
        let cities: HashSet<&str> = self.stations.iter().map(|s| s.city.as_str()).collect();
        let states: HashSet<&str> = self.stations.iter().map(|s| s.state.as_str()).collect();
        let total_power: f64 = self.stations.iter().map(|s| s.power_kw).sum();
        let average_power = if self.stations.is_empty() {
            0.0
        } else {
            round1(total_power / self.stations.len() as f64)
        };

        NetworkSummary {
            total_stations: self.stations.len(),
            total_networks: networks.len(),
            networks,
            cities: cities.len(),
            states: states.len(),
            total_power: total_power.round(),
            average_power,
        }
    }
}

#[async_trait]
impl StationSource for NetworkDirectory {
    fn kind(&self) -> StationSourceKind {
        StationSourceKind::Network
    }

    async fn list_stations(
        &self,
        filters: &StationFilters,
    ) -> Result<Vec<StationRecord>, SourceError> {
        Ok(self.filtered(filters))
    }
}
