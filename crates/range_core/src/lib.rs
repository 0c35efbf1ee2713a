pub mod calculator;
pub mod geo;
mod models;
mod ranking;

pub use crate::calculator::{
    RangeEstimate, ReachabilityReport, check_reachability, estimate_range, km_to_miles, round1,
};
pub use crate::geo::{DistanceCalculator, Haversine, haversine_km, midpoint};
pub use crate::models::*;
pub use crate::ranking::NearestStationRanker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One or more input fields failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid input: {}", describe(.0))]
pub struct ValidationError(Vec<FieldError>);

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: &str, message: &str) -> Self {
        ValidationError(vec![FieldError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }
}

/// Collects field errors so every bad field is reported at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field: field.into(),
                message: message.into(),
            });
        }
        self
    }

    pub fn merge(&mut self, result: Result<(), ValidationError>) -> &mut Self {
        if let Err(err) = result {
            self.errors.extend(err.0);
        }
        self
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self.errors))
        }
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Station {station_id} not found")]
    StationNotFound { station_id: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Review figures over the local directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total_stations: usize,
    pub verified_stations: usize,
    pub pending_stations: usize,
    /// Sum of the verified stations' power, rounded to whole kW.
    pub total_power_capacity: f64,
}

/// The local station directory: owner-submitted stations awaiting or holding
/// admin approval. Insertion order is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDirectory {
    stations: Vec<StationRecord>,
}

impl StationDirectory {
    pub fn new(stations: Vec<StationRecord>) -> Self {
        StationDirectory { stations }
    }

    /// Every station, verified or not.
    pub fn all_stations(&self) -> &[StationRecord] {
        &self.stations
    }

    /// Snapshot of the publicly visible stations.
    pub fn verified_stations(&self) -> Vec<StationRecord> {
        self.stations.iter().filter(|s| s.verified).cloned().collect()
    }

    pub fn get_verified(&self, station_id: &str) -> Result<&StationRecord, DirectoryError> {
        self.stations
            .iter()
            .find(|s| s.id == station_id && s.verified)
            .ok_or_else(|| DirectoryError::StationNotFound {
                station_id: station_id.into(),
            })
    }

    fn get_mut(&mut self, station_id: &str) -> Result<&mut StationRecord, DirectoryError> {
        self.stations
            .iter_mut()
            .find(|s| s.id == station_id)
            .ok_or_else(|| DirectoryError::StationNotFound {
                station_id: station_id.into(),
            })
    }

    /// Add a station submitted by an owner. It stays hidden until verified.
    pub fn submit_station(&mut self, new_station: NewStation) -> Result<StationRecord, DirectoryError> {
        new_station.validate()?;

        let station = StationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_station.name.trim().to_string(),
            address: new_station.address.trim().to_string(),
            city: new_station.city.trim().to_string(),
            state: new_station.state.trim().to_string(),
            zip_code: new_station.zip_code,
            location: new_station.location,
            connector_type: new_station.connector_type.trim().to_string(),
            power_kw: new_station.power_kw,
            availability: new_station.availability,
            verified: false,
            owner_id: new_station.owner_id,
            network: None,
        };
        tracing::info!("Station {} submitted for review", station.id);

        self.stations.push(station.clone());
        Ok(station)
    }

    pub fn update_station(
        &mut self,
        station_id: &str,
        update: StationUpdate,
    ) -> Result<StationRecord, DirectoryError> {
        update.validate()?;
        let station = self.get_mut(station_id)?;

        if let Some(name) = update.name {
            station.name = name.trim().to_string();
        }
        if let Some(address) = update.address {
            station.address = address.trim().to_string();
        }
        if let Some(power_kw) = update.power_kw {
            station.power_kw = power_kw;
        }
        if let Some(availability) = update.availability {
            station.availability = availability;
        }
        if let Some(location) = update.location {
            station.location = Some(location);
        }
        tracing::info!("Station {} updated", station_id);

        Ok(station.clone())
    }

    pub fn set_verified(
        &mut self,
        station_id: &str,
        verified: bool,
    ) -> Result<StationRecord, DirectoryError> {
        let station = self.get_mut(station_id)?;
        station.verified = verified;
        tracing::info!("Station {} verified: {}", station_id, verified);
        Ok(station.clone())
    }

    pub fn stats(&self) -> DirectoryStats {
        let verified: Vec<_> = self.stations.iter().filter(|s| s.verified).collect();
        DirectoryStats {
            total_stations: self.stations.len(),
            verified_stations: verified.len(),
            pending_stations: self.stations.len() - verified.len(),
            total_power_capacity: verified.iter().map(|s| s.power_kw).sum::<f64>().round(),
        }
    }

    pub fn remove_station(&mut self, station_id: &str) -> Result<StationRecord, DirectoryError> {
        let idx = self
            .stations
            .iter()
            .position(|s| s.id == station_id)
            .ok_or_else(|| DirectoryError::StationNotFound {
                station_id: station_id.into(),
            })?;
        tracing::info!("Removing station {}", station_id);
        Ok(self.stations.remove(idx))
    }
}
