use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use range_core::{DirectoryError, DirectoryStats, NewStation, StationRecord, StationSourceKind, StationUpdate};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, JsonBody, NearbyQuery, NearbyResponse, error_response, validation_error_response,
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationListResponse {
    pub stations: Vec<StationRecord>,
    pub total: usize,
}

impl StationListResponse {
    pub(crate) fn new(stations: Vec<StationRecord>) -> Self {
        StationListResponse {
            total: stations.len(),
            stations,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub station: StationRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStatsResponse {
    pub stats: DirectoryStats,
}

fn directory_error_to_response(error: DirectoryError) -> Response {
    match error {
        DirectoryError::StationNotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, "Station not found")
        }
        DirectoryError::Invalid(error) => validation_error_response(error),
    }
}

fn station_response(result: Result<StationRecord, DirectoryError>, message: &str) -> Response {
    match result {
        Ok(station) => Json(StationResponse {
            message: Some(message.to_string()),
            station,
        })
        .into_response(),
        Err(error) => directory_error_to_response(error),
    }
}

/// List the verified stations of the local directory
pub async fn list_stations(State(app_state): State<AppState>) -> Json<StationListResponse> {
    tracing::info!("Listing verified stations");
    let stations = app_state.directory().verified_stations();
    Json(StationListResponse::new(stations))
}

/// Get one verified station
pub async fn get_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Response {
    let directory = app_state.directory();
    match directory.get_verified(&station_id) {
        Ok(station) => Json(StationResponse {
            message: None,
            station: station.clone(),
        })
        .into_response(),
        Err(error) => directory_error_to_response(error),
    }
}

/// Submit a new station for review
pub async fn create_station(
    State(app_state): State<AppState>,
    JsonBody(payload): JsonBody<NewStation>,
) -> Response {
    let mut directory = app_state.directory();
    match directory.submit_station(payload) {
        Ok(station) => (
            StatusCode::CREATED,
            Json(StationResponse {
                message: Some("Station created successfully".to_string()),
                station,
            }),
        )
            .into_response(),
        Err(error) => directory_error_to_response(error),
    }
}

/// Update some fields of a station
pub async fn update_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
    JsonBody(payload): JsonBody<StationUpdate>,
) -> Response {
    let result = app_state.directory().update_station(&station_id, payload);
    station_response(result, "Station updated successfully")
}

/// Remove a station from the directory
pub async fn delete_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Response {
    match app_state.directory().remove_station(&station_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => directory_error_to_response(error),
    }
}

/// Find verified stations around a point
pub async fn search_nearby(
    State(app_state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Response {
    let (reference, search) = match query.resolve(app_state.planner.search_settings()) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match app_state
        .planner
        .search_nearby(&reference, Some(StationSourceKind::Verified), &search)
        .await
    {
        Ok(stations) => {
            Json(NearbyResponse::new(reference, search.radius_km, stations)).into_response()
        }
        Err(error) => validation_error_response(error),
    }
}

/// Every station, including those awaiting review
pub async fn list_all_stations(State(app_state): State<AppState>) -> Json<StationListResponse> {
    tracing::info!("Listing all stations");
    let stations = app_state.directory().all_stations().to_vec();
    Json(StationListResponse::new(stations))
}

/// Review dashboard figures
pub async fn stats(State(app_state): State<AppState>) -> Json<DirectoryStatsResponse> {
    Json(DirectoryStatsResponse {
        stats: app_state.directory().stats(),
    })
}

/// Approve a station
pub async fn verify_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Response {
    let result = app_state.directory().set_verified(&station_id, true);
    station_response(result, "Station verified successfully")
}

/// Withdraw the approval of a station
pub async fn unverify_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Response {
    let result = app_state.directory().set_verified(&station_id, false);
    station_response(result, "Station unverified successfully")
}
