use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ValidationError, Validator};

pub const DEFAULT_BATTERY_CAPACITY_KWH: f64 = 60.0;
pub const DEFAULT_EFFICIENCY_KWH_PER_100KM: f64 = 20.0;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        let point = GeoPoint {
            latitude,
            longitude,
        };
        point.validate("latitude", "longitude")?;
        Ok(point)
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Check the coordinates, reporting errors against the given field names.
    pub fn validate(&self, lat_field: &str, lng_field: &str) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        validator.check(
            self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude),
            lat_field,
            "Latitude must be between -90 and 90",
        );
        validator.check(
            self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude),
            lng_field,
            "Longitude must be between -180 and 180",
        );
        validator.finish()
    }
}

/// Parses a `"lat,lng"` pair such as `"28.6304, 77.2177"`.
impl FromStr for GeoPoint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::single("location", "Expected coordinates as \"lat,lng\"");
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = lng.trim().parse().map_err(|_| invalid())?;
        GeoPoint::new(latitude, longitude)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
    Maintenance,
}

/// Which backing collection a station was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationSourceKind {
    /// Owner-submitted, admin-approved local directory.
    Verified,
    /// External charging network listing.
    Network,
}

impl std::fmt::Display for StationSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationSourceKind::Verified => write!(f, "verified"),
            StationSourceKind::Network => write!(f, "network"),
        }
    }
}

/// A charging point as held by one of the station directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Stations without a location never take part in distance ranking.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub connector_type: String,
    pub power_kw: f64,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Operator name, set for network stations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// A station together with its distance from the search reference point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStation {
    #[serde(flatten)]
    pub station: StationRecord,
    pub distance_km: f64,
    pub source: StationSourceKind,
}

/// Battery and consumption characteristics of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    pub battery_capacity_kwh: f64,
    pub efficiency_kwh_per_100km: f64,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        VehicleProfile {
            battery_capacity_kwh: DEFAULT_BATTERY_CAPACITY_KWH,
            efficiency_kwh_per_100km: DEFAULT_EFFICIENCY_KWH_PER_100KM,
        }
    }
}

impl VehicleProfile {
    /// Build a profile, falling back to the defaults for missing values.
    pub fn from_optional(battery_capacity_kwh: Option<f64>, efficiency: Option<f64>) -> Self {
        let defaults = VehicleProfile::default();
        VehicleProfile {
            battery_capacity_kwh: battery_capacity_kwh.unwrap_or(defaults.battery_capacity_kwh),
            efficiency_kwh_per_100km: efficiency.unwrap_or(defaults.efficiency_kwh_per_100km),
        }
    }

    pub(crate) fn check(&self, validator: &mut Validator) {
        validator.check(
            self.battery_capacity_kwh.is_finite() && self.battery_capacity_kwh > 0.0,
            "batteryCapacity",
            "Battery capacity must be positive",
        );
        validator.check(
            self.efficiency_kwh_per_100km.is_finite() && self.efficiency_kwh_per_100km > 0.0,
            "efficiency",
            "Efficiency must be positive",
        );
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        self.check(&mut validator);
        validator.finish()
    }
}

/// Distance unit accepted at the API boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Miles,
}

/// Fields of a station submitted by an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStation {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    pub connector_type: String,
    pub power_kw: f64,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl NewStation {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        validator.check(!self.name.trim().is_empty(), "name", "Name is required");
        validator.check(
            !self.address.trim().is_empty(),
            "address",
            "Address is required",
        );
        validator.check(!self.city.trim().is_empty(), "city", "City is required");
        validator.check(!self.state.trim().is_empty(), "state", "State is required");
        validator.check(
            !self.connector_type.trim().is_empty(),
            "connectorType",
            "Connector type is required",
        );
        check_power(&mut validator, self.power_kw);
        if let Some(location) = &self.location {
            validator.merge(location.validate("location.latitude", "location.longitude"));
        }
        validator.finish()
    }
}

/// Partial update of a station; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub power_kw: Option<f64>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl StationUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        if let Some(name) = &self.name {
            validator.check(!name.trim().is_empty(), "name", "Name cannot be empty");
        }
        if let Some(address) = &self.address {
            validator.check(
                !address.trim().is_empty(),
                "address",
                "Address cannot be empty",
            );
        }
        if let Some(power_kw) = self.power_kw {
            check_power(&mut validator, power_kw);
        }
        if let Some(location) = &self.location {
            validator.merge(location.validate("location.latitude", "location.longitude"));
        }
        validator.finish()
    }
}

fn check_power(validator: &mut Validator, power_kw: f64) {
    validator.check(
        power_kw.is_finite() && power_kw >= 0.0,
        "powerKw",
        "Power must be positive",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_bounds() {
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
        let err = GeoPoint::new(91.0, 181.0).unwrap_err();
        let fields: Vec<_> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["latitude", "longitude"]);
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_geo_point_from_pair() {
        let point: GeoPoint = "28.6304, 77.2177".parse().unwrap();
        assert_eq!(point.latitude, 28.6304);
        assert_eq!(point.longitude, 77.2177);

        assert!("Connaught Place".parse::<GeoPoint>().is_err());
        assert!("28.6,abc".parse::<GeoPoint>().is_err());
        assert!("128.6,77.2".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn test_vehicle_profile_defaults() {
        let profile = VehicleProfile::from_optional(None, Some(15.0));
        assert_eq!(profile.battery_capacity_kwh, 60.0);
        assert_eq!(profile.efficiency_kwh_per_100km, 15.0);
    }

    #[test]
    fn test_new_station_validation() {
        let station = NewStation {
            name: "  ".into(),
            address: "Bandra Kurla Complex".into(),
            city: "Mumbai".into(),
            state: "Maharashtra".into(),
            zip_code: None,
            location: Some(GeoPoint {
                latitude: 19.0596,
                longitude: 272.0,
            }),
            connector_type: "Type 2".into(),
            power_kw: -1.0,
            availability: Availability::Available,
            owner_id: None,
        };
        let err = station.validate().unwrap_err();
        let fields: Vec<_> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "powerKw", "location.longitude"]);
    }

    #[test]
    fn test_station_record_json() {
        let json = r#"
        {
          "id": "net_1",
          "name": "Statiq Charging Station - Connaught Place",
          "address": "Connaught Place",
          "city": "New Delhi",
          "state": "Delhi",
          "zipCode": "110001",
          "location": {"latitude": 28.6304, "longitude": 77.2177},
          "connectorType": "CCS",
          "powerKw": 50,
          "network": "Statiq"
        }
        "#;

        let station: StationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(station.zip_code.as_deref(), Some("110001"));
        assert_eq!(station.availability, Availability::Available);
        assert!(!station.verified);
        assert_eq!(station.power_kw, 50.0);
        assert!(station.owner_id.is_none());
    }

    #[test]
    fn test_ranked_station_is_flattened() {
        let ranked = RankedStation {
            station: StationRecord {
                id: "1".into(),
                name: "Depot".into(),
                address: "1 Main St".into(),
                city: "Pune".into(),
                state: "Maharashtra".into(),
                zip_code: None,
                location: None,
                connector_type: "CCS".into(),
                power_kw: 60.0,
                availability: Availability::Maintenance,
                verified: true,
                owner_id: Some("owner-1".into()),
                network: None,
            },
            distance_km: 4.2,
            source: StationSourceKind::Verified,
        };
        let value = serde_json::to_value(&ranked).unwrap();
        assert_eq!(value["name"], "Depot");
        assert_eq!(value["distanceKm"], 4.2);
        assert_eq!(value["source"], "verified");
        assert_eq!(value["availability"], "maintenance");
    }
}
