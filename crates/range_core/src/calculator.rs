//! Range estimation and trip reachability.

use serde::{Deserialize, Serialize};

use crate::{DistanceUnit, ValidationError, Validator, VehicleProfile};

/// Miles to kilometers, applied to distances entered in miles.
pub const MILES_TO_KM: f64 = 1.60934;
/// Kilometers to miles, applied to every displayed distance.
pub const KM_TO_MILES: f64 = 0.621371;

pub const REACHABLE_RECOMMENDATION: &str =
    "Reachable - You have sufficient battery to reach your destination";

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn km_to_miles(km: f64) -> f64 {
    km * KM_TO_MILES
}

pub fn miles_to_km(miles: f64) -> f64 {
    miles * MILES_TO_KM
}

impl DistanceUnit {
    /// Convert a distance expressed in this unit to kilometers.
    pub fn to_km(self, distance: f64) -> f64 {
        match self {
            DistanceUnit::Km => distance,
            DistanceUnit::Miles => miles_to_km(distance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeEstimate {
    pub range_km: f64,
    pub range_miles: f64,
    pub available_energy_kwh: f64,
}

impl VehicleProfile {
    /// Energy left in the pack at the given state of charge.
    pub fn available_energy_kwh(&self, battery_percentage: f64) -> f64 {
        (battery_percentage / 100.0) * self.battery_capacity_kwh
    }

    /// Unrounded range in kilometers at the given state of charge.
    pub fn range_km(&self, battery_percentage: f64) -> f64 {
        (self.available_energy_kwh(battery_percentage) / self.efficiency_kwh_per_100km) * 100.0
    }
}

/// Report an out-of-range battery percentage against `batteryPercentage`.
pub fn check_battery_percentage(validator: &mut Validator, battery_percentage: f64) {
    validator.check(
        battery_percentage.is_finite() && (0.0..=100.0).contains(&battery_percentage),
        "batteryPercentage",
        "Battery percentage must be between 0 and 100",
    );
}

/// Check the inputs of [`estimate_range`] without computing anything.
pub fn validate_range_inputs(
    battery_percentage: f64,
    profile: &VehicleProfile,
) -> Result<(), ValidationError> {
    let mut validator = Validator::default();
    check_battery_percentage(&mut validator, battery_percentage);
    profile.check(&mut validator);
    validator.finish()
}

/// Estimate how far the vehicle can drive on its current charge.
pub fn estimate_range(
    battery_percentage: f64,
    profile: &VehicleProfile,
) -> Result<RangeEstimate, ValidationError> {
    validate_range_inputs(battery_percentage, profile)?;

    let available_energy_kwh = profile.available_energy_kwh(battery_percentage);
    let range_km = profile.range_km(battery_percentage);

    Ok(RangeEstimate {
        range_km: round1(range_km),
        range_miles: round1(km_to_miles(range_km)),
        available_energy_kwh: round1(available_energy_kwh),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityReport {
    pub is_reachable: bool,
    /// Range left on arrival; negative when the trip is out of reach.
    pub remaining_range_km: f64,
    pub battery_needed_percent: f64,
    pub recommendation: String,
}

/// Compare a trip distance against the available range.
///
/// When the trip is out of reach, the energy deficit is expressed as the
/// battery percentage that would have to be added to cover it.
pub fn check_reachability(
    distance_km: f64,
    range_km: f64,
    profile: &VehicleProfile,
) -> Result<ReachabilityReport, ValidationError> {
    let mut validator = Validator::default();
    validator.check(
        distance_km.is_finite() && distance_km >= 0.0,
        "distance",
        "Distance must be positive",
    );
    validator.check(
        range_km.is_finite() && range_km >= 0.0,
        "currentRange",
        "Current range must be positive",
    );
    profile.check(&mut validator);
    validator.finish()?;

    let is_reachable = range_km >= distance_km;
    let remaining_range_km = range_km - distance_km;

    if is_reachable {
        return Ok(ReachabilityReport {
            is_reachable,
            remaining_range_km,
            battery_needed_percent: 0.0,
            recommendation: REACHABLE_RECOMMENDATION.to_string(),
        });
    }

    let shortfall_km = distance_km - range_km;
    let battery_needed = (shortfall_km / (profile.efficiency_kwh_per_100km / 100.0))
        / profile.battery_capacity_kwh
        * 100.0;

    Ok(ReachabilityReport {
        is_reachable,
        remaining_range_km,
        battery_needed_percent: round1(battery_needed),
        recommendation: format!(
            "Charging Required - You need approximately {}% more battery or {} km more range",
            battery_needed.round(),
            round1(shortfall_km)
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(capacity: f64, efficiency: f64) -> VehicleProfile {
        VehicleProfile {
            battery_capacity_kwh: capacity,
            efficiency_kwh_per_100km: efficiency,
        }
    }

    #[test]
    fn test_estimate_range_half_battery() {
        let estimate = estimate_range(50.0, &VehicleProfile::default()).unwrap();
        assert_eq!(estimate.available_energy_kwh, 30.0);
        assert_eq!(estimate.range_km, 150.0);
        assert_eq!(estimate.range_miles, 93.2);
    }

    #[test]
    fn test_estimate_range_boundaries() {
        let empty = estimate_range(0.0, &profile(75.0, 18.0)).unwrap();
        assert_eq!(empty.range_km, 0.0);
        assert_eq!(empty.range_miles, 0.0);
        assert_eq!(empty.available_energy_kwh, 0.0);

        let full = estimate_range(100.0, &profile(75.0, 18.0)).unwrap();
        assert_eq!(full.range_km, round1(75.0 / 18.0 * 100.0));
        assert_eq!(full.range_km, 416.7);
    }

    #[test]
    fn test_estimate_range_is_pure() {
        let first = estimate_range(37.5, &profile(82.0, 17.3)).unwrap();
        let second = estimate_range(37.5, &profile(82.0, 17.3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_estimate_range_monotonic() {
        let mut previous = 0.0;
        for capacity in [10.0, 40.0, 60.0, 80.0, 120.0] {
            let range = estimate_range(64.0, &profile(capacity, 20.0))
                .unwrap()
                .range_km;
            assert!(range >= previous);
            previous = range;
        }

        let mut previous = f64::INFINITY;
        for efficiency in [10.0, 14.5, 20.0, 26.0, 31.0] {
            let range = estimate_range(64.0, &profile(60.0, efficiency))
                .unwrap()
                .range_km;
            assert!(range <= previous);
            previous = range;
        }
    }

    #[test]
    fn test_estimate_range_validation() {
        let err = estimate_range(120.0, &profile(0.0, -3.0)).unwrap_err();
        let fields: Vec<_> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["batteryPercentage", "batteryCapacity", "efficiency"]);

        assert!(estimate_range(-0.1, &VehicleProfile::default()).is_err());
        assert!(estimate_range(f64::NAN, &VehicleProfile::default()).is_err());
    }

    #[test]
    fn test_unit_constants_applied_independently() {
        assert!((miles_to_km(100.0) - 160.934).abs() < 1e-9);
        assert!((km_to_miles(100.0) - 62.1371).abs() < 1e-9);
        assert!((DistanceUnit::Miles.to_km(10.0) - 16.0934).abs() < 1e-9);
        assert_eq!(DistanceUnit::Km.to_km(10.0), 10.0);

        // The two factors are not reciprocals of each other.
        let round_trip = km_to_miles(miles_to_km(1000.0));
        assert!((round_trip - 1000.0).abs() > 1e-6);
        assert!((round_trip - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(93.2056), 93.2);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(-0.25), -0.3);
        assert_eq!(round1(12.0), 12.0);
    }

    #[test]
    fn test_unreachable_trip() {
        let report = check_reachability(200.0, 150.0, &VehicleProfile::default()).unwrap();
        assert!(!report.is_reachable);
        assert_eq!(report.remaining_range_km, -50.0);
        // (50 / 0.2) / 60 * 100
        assert_eq!(report.battery_needed_percent, 416.7);
        assert_eq!(
            report.recommendation,
            "Charging Required - You need approximately 417% more battery or 50 km more range"
        );
    }

    #[test]
    fn test_reachable_trip() {
        let report = check_reachability(120.0, 150.0, &VehicleProfile::default()).unwrap();
        assert!(report.is_reachable);
        assert_eq!(report.remaining_range_km, 30.0);
        assert_eq!(report.battery_needed_percent, 0.0);
        assert_eq!(report.recommendation, REACHABLE_RECOMMENDATION);
    }

    #[test]
    fn test_reachability_boundary_is_inclusive() {
        let report = check_reachability(150.0, 150.0, &VehicleProfile::default()).unwrap();
        assert!(report.is_reachable);
        assert_eq!(report.remaining_range_km, 0.0);
        assert_eq!(report.battery_needed_percent, 0.0);
    }

    #[test]
    fn test_reachability_shortfall_is_rounded_in_recommendation() {
        let report = check_reachability(12.34, 0.0, &profile(40.0, 16.0)).unwrap();
        assert!(!report.is_reachable);
        assert!(report.recommendation.ends_with("or 12.3 km more range"));
    }

    #[test]
    fn test_reachability_validation() {
        let err = check_reachability(-1.0, f64::INFINITY, &profile(60.0, 0.0)).unwrap_err();
        let fields: Vec<_> = err.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["distance", "currentRange", "efficiency"]);
    }
}
