use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use range_core::{StationRecord, StationSourceKind};
use range_engine::{NetworkSummary, StationFilters};
use serde::{Deserialize, Serialize};

use crate::{AppState, NearbyQuery, NearbyResponse, error_response, validation_error_response};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkListResponse {
    pub stations: Vec<StationRecord>,
    pub total: usize,
    pub source: StationSourceKind,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummaryResponse {
    pub stats: NetworkSummary,
}

pub async fn list_stations(
    State(app_state): State<AppState>,
    Query(filters): Query<StationFilters>,
) -> Json<NetworkListResponse> {
    let stations = app_state.network.filtered(&filters);
    tracing::debug!("{} network station(s) match {:?}", stations.len(), filters);
    Json(NetworkListResponse {
        total: stations.len(),
        stations,
        source: StationSourceKind::Network,
    })
}

pub async fn get_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Response {
    match app_state.network.get(&station_id) {
        Some(station) => Json(station.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Network station not found"),
    }
}

/// Rank network stations around a point
pub async fn search_location(
    State(app_state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Response {
    let (reference, search) = match query.resolve(app_state.planner.search_settings()) {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match app_state
        .planner
        .search_nearby(&reference, Some(StationSourceKind::Network), &search)
        .await
    {
        Ok(stations) => {
            Json(NearbyResponse::new(reference, search.radius_km, stations)).into_response()
        }
        Err(error) => validation_error_response(error),
    }
}

pub async fn summary(State(app_state): State<AppState>) -> Json<NetworkSummaryResponse> {
    Json(NetworkSummaryResponse {
        stats: app_state.network.summary(),
    })
}
