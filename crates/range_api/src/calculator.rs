use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use range_core::{
    DistanceUnit, RankedStation, ReachabilityReport, Validator, VehicleProfile,
    calculator::{check_battery_percentage, validate_range_inputs},
    check_reachability, estimate_range as estimate, km_to_miles, round1,
};
use range_engine::{GeocodingError, PlannerError, RouteQuery};
use serde::{Deserialize, Serialize};

use crate::{AppState, JsonBody, error_response, validation_error_response};

/// A distance shown in both units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceView {
    pub kilometers: f64,
    pub miles: f64,
}

impl DistanceView {
    pub fn from_km(km: f64) -> Self {
        DistanceView {
            kilometers: round1(km),
            miles: round1(km_to_miles(km)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRequest {
    pub battery_percentage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub efficiency: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeResponse {
    pub battery_percentage: f64,
    pub battery_capacity: f64,
    pub efficiency: f64,
    pub range: DistanceView,
    pub available_energy: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheckRequest {
    pub distance: Option<f64>,
    pub battery_percentage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub efficiency: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCheckResponse {
    pub distance: DistanceView,
    pub current_range: DistanceView,
    pub is_reachable: bool,
    pub remaining_range: DistanceView,
    pub recommendation: String,
    pub battery_needed: f64,
}

impl RouteCheckResponse {
    fn new(distance_km: f64, range_km: f64, report: ReachabilityReport) -> Self {
        RouteCheckResponse {
            distance: DistanceView::from_km(distance_km),
            current_range: DistanceView::from_km(range_km),
            is_reachable: report.is_reachable,
            remaining_range: DistanceView::from_km(report.remaining_range_km),
            recommendation: report.recommendation,
            battery_needed: report.battery_needed_percent,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationCheckRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    pub current_range: Option<f64>,
    pub battery_percentage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub use_current_location: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationCheckResponse {
    #[serde(flatten)]
    pub check: RouteCheckResponse,
    pub charging_stations: Vec<RankedStation>,
    /// Explains an empty suggestion list on an unreachable route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stations_message: Option<String>,
}

fn parse_unit(unit: Option<&str>) -> Option<DistanceUnit> {
    match unit {
        None | Some("km") => Some(DistanceUnit::Km),
        Some("miles") => Some(DistanceUnit::Miles),
        Some(_) => None,
    }
}

/// Calculate the range of the vehicle on its current charge
pub async fn estimate_range(JsonBody(payload): JsonBody<RangeRequest>) -> Response {
    let profile = VehicleProfile::from_optional(payload.battery_capacity, payload.efficiency);
    let battery_percentage = payload.battery_percentage.unwrap_or(f64::NAN);

    match estimate(battery_percentage, &profile) {
        Ok(range) => {
            tracing::info!("Estimated range: {} km", range.range_km);
            Json(RangeResponse {
                battery_percentage,
                battery_capacity: profile.battery_capacity_kwh,
                efficiency: profile.efficiency_kwh_per_100km,
                range: DistanceView {
                    kilometers: range.range_km,
                    miles: range.range_miles,
                },
                available_energy: range.available_energy_kwh,
            })
            .into_response()
        }
        Err(error) => validation_error_response(error),
    }
}

/// Check whether a trip of a given length fits in the current range
pub async fn route_check(JsonBody(payload): JsonBody<RouteCheckRequest>) -> Response {
    let profile = VehicleProfile::from_optional(payload.battery_capacity, payload.efficiency);
    let battery_percentage = payload.battery_percentage.unwrap_or(f64::NAN);
    let distance = payload.distance.unwrap_or(f64::NAN);
    let unit = parse_unit(payload.unit.as_deref());

    let mut validator = Validator::default();
    validator
        .check(
            distance.is_finite() && distance >= 0.0,
            "distance",
            "Distance must be positive",
        )
        .merge(validate_range_inputs(battery_percentage, &profile))
        .check(unit.is_some(), "unit", "Unit must be km or miles");
    if let Err(error) = validator.finish() {
        return validation_error_response(error);
    }

    let distance_km = unit.unwrap_or_default().to_km(distance);
    let range_km = profile.range_km(battery_percentage);

    match check_reachability(distance_km, range_km, &profile) {
        Ok(report) => {
            tracing::info!(
                "Route check: {:.1} km against {:.1} km of range, reachable: {}",
                distance_km,
                range_km,
                report.is_reachable
            );
            Json(RouteCheckResponse::new(distance_km, range_km, report)).into_response()
        }
        Err(error) => validation_error_response(error),
    }
}

fn planner_error_to_response(error: PlannerError) -> Response {
    match error {
        PlannerError::Invalid(error) => validation_error_response(error),
        PlannerError::Geocoding(
            error @ (GeocodingError::OriginNotFound | GeocodingError::DestinationNotFound),
        ) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
        PlannerError::Geocoding(error @ GeocodingError::Unavailable { .. }) => {
            error_response(StatusCode::BAD_GATEWAY, error.to_string())
        }
    }
}

/// Check whether a named destination is reachable and suggest charging stops
pub async fn destination_check(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<DestinationCheckRequest>,
) -> Response {
    let profile = VehicleProfile::from_optional(payload.battery_capacity, payload.efficiency);

    let mut validator = Validator::default();
    let range_km = match (payload.current_range, payload.battery_percentage) {
        (Some(range_km), _) => range_km,
        (None, Some(battery_percentage)) => {
            check_battery_percentage(&mut validator, battery_percentage);
            // Bad inputs are reported on their own fields, not as a bad range.
            if validate_range_inputs(battery_percentage, &profile).is_ok() {
                profile.range_km(battery_percentage)
            } else {
                0.0
            }
        }
        (None, None) => f64::NAN,
    };

    let query = RouteQuery {
        origin: payload.origin,
        destination: payload.destination,
        use_current_location: payload.use_current_location,
        range_km,
        profile,
    };
    validator.merge(query.validate());
    if let Err(error) = validator.finish() {
        return validation_error_response(error);
    }

    let report = match app_state.planner.check_reachability_by_names(&query).await {
        Ok(report) => report,
        Err(error) => return planner_error_to_response(error),
    };

    let nothing_to_suggest =
        !report.reachability.is_reachable && report.charging_stations.is_empty();
    let stations_message = nothing_to_suggest.then(|| {
        format!(
            "No charging stations found within {} km of your route",
            app_state.planner.search_settings().radius_km
        )
    });

    Json(DestinationCheckResponse {
        check: RouteCheckResponse::new(report.distance_km, report.range_km, report.reachability),
        charging_stations: report.charging_stations,
        stations_message,
    })
    .into_response()
}
