//! EV Range API Library
//!
//! This library provides the HTTP API for the range calculator and the
//! charging station directories.

mod calculator;
mod network;
mod station;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use range_core::{FieldError, GeoPoint, RankedStation, StationDirectory, ValidationError};
use range_engine::{
    Geocoder, NetworkDirectory, RoutePlanner, SearchSettings, StationSource, VerifiedDirectory,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::trace::TraceLayer;

pub use calculator::{
    DestinationCheckRequest, DestinationCheckResponse, DistanceView, RangeRequest, RangeResponse,
    RouteCheckRequest, RouteCheckResponse,
};
pub use network::{NetworkListResponse, NetworkSummaryResponse};
pub use station::{DirectoryStatsResponse, StationListResponse, StationResponse};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    directory: Arc<Mutex<StationDirectory>>,
    network: Arc<NetworkDirectory>,
    planner: Arc<RoutePlanner>,
}

impl AppState {
    /// Wire the planner to both station directories.
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        directory: StationDirectory,
        network: NetworkDirectory,
        search: SearchSettings,
    ) -> Self {
        let verified = VerifiedDirectory::new(directory);
        let network = Arc::new(network);
        let sources: Vec<Arc<dyn StationSource>> =
            vec![Arc::new(verified.clone()), network.clone()];
        let planner = RoutePlanner::new(geocoder, sources).with_search(search);

        AppState {
            directory: verified.shared(),
            network,
            planner: Arc::new(planner),
        }
    }

    /// Lock the local directory. A panic in another handler does not leave
    /// the directory half-written, so a poisoned lock is recovered.
    fn directory(&self) -> MutexGuard<'_, StationDirectory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn validation_error_response(error: ValidationError) -> Response {
    tracing::info!("Rejected request: {}", error);
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationErrorResponse {
            errors: error.into_errors(),
        }),
    )
        .into_response()
}

/// JSON request body whose rejections use the field error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(validation_error_response(ValidationError::single(
                "body",
                &rejection.body_text(),
            ))),
        }
    }
}

/// Query string of the location searches.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub limit: Option<usize>,
}

impl NearbyQuery {
    /// Reference point and search settings, with the configured defaults
    /// filling the gaps.
    fn resolve(&self, defaults: SearchSettings) -> Result<(GeoPoint, SearchSettings), Response> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Latitude and longitude are required",
            ));
        };
        let settings = SearchSettings {
            radius_km: self.radius.unwrap_or(defaults.radius_km),
            limit: self.limit.unwrap_or(defaults.limit),
        };
        Ok((
            GeoPoint {
                latitude: lat,
                longitude: lng,
            },
            settings,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResponse {
    pub stations: Vec<RankedStation>,
    pub total: usize,
    pub location: SearchLocation,
    pub radius: f64,
    /// Set when nothing was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NearbyResponse {
    fn new(reference: GeoPoint, radius: f64, stations: Vec<RankedStation>) -> Self {
        let message = stations
            .is_empty()
            .then(|| format!("No charging stations found within {radius} km"));
        NearbyResponse {
            total: stations.len(),
            stations,
            location: SearchLocation {
                lat: reference.latitude,
                lng: reference.longitude,
            },
            radius,
            message,
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Create the application router with all endpoints
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/calculator/range", post(calculator::estimate_range))
        .route("/calculator/route-check", post(calculator::route_check))
        .route(
            "/calculator/destination-check",
            post(calculator::destination_check),
        )
        .route(
            "/stations",
            get(station::list_stations).post(station::create_station),
        )
        .route("/stations/search/nearby", get(station::search_nearby))
        .route(
            "/stations/{station_id}",
            get(station::get_station)
                .put(station::update_station)
                .delete(station::delete_station),
        )
        .route("/admin/stations", get(station::list_all_stations))
        .route("/admin/stats", get(station::stats))
        .route(
            "/admin/stations/{station_id}/verify",
            post(station::verify_station),
        )
        .route(
            "/admin/stations/{station_id}/unverify",
            post(station::unverify_station),
        )
        .route("/network-stations", get(network::list_stations))
        .route(
            "/network-stations/search/location",
            get(network::search_location),
        )
        .route("/network-stations/stats/summary", get(network::summary))
        .route("/network-stations/{station_id}", get(network::get_station))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use range_core::{Availability, StationRecord, StationSourceKind};
    use range_engine::FixedGeocoder;
    use tower::util::ServiceExt;

    pub(crate) const CONNAUGHT_PLACE: GeoPoint = GeoPoint {
        latitude: 28.6304,
        longitude: 77.2177,
    };

    pub(crate) fn station(id: &str, city: &str, location: Option<GeoPoint>) -> StationRecord {
        StationRecord {
            id: id.into(),
            name: format!("Station {id}"),
            address: "Main Road".into(),
            city: city.into(),
            state: "Delhi".into(),
            zip_code: None,
            location,
            connector_type: "CCS".into(),
            power_kw: 50.0,
            availability: Availability::Available,
            verified: true,
            owner_id: None,
            network: None,
        }
    }

    pub(crate) fn network_station(
        id: &str,
        city: &str,
        state: &str,
        network: &str,
        location: GeoPoint,
        power_kw: f64,
    ) -> StationRecord {
        StationRecord {
            state: state.into(),
            power_kw,
            network: Some(network.into()),
            verified: false,
            ..station(id, city, Some(location))
        }
    }

    pub(crate) fn test_state() -> AppState {
        let geocoder = FixedGeocoder::default()
            .with_place("Connaught Place", CONNAUGHT_PLACE)
            .with_place(
                "Gurgaon",
                GeoPoint {
                    latitude: 28.4595,
                    longitude: 77.0266,
                },
            );

        let mut pending = station("local_pending", "New Delhi", None);
        pending.verified = false;
        let directory = StationDirectory::new(vec![
            station(
                "local_1",
                "New Delhi",
                Some(GeoPoint {
                    latitude: 28.55,
                    longitude: 77.12,
                }),
            ),
            station("local_unplaced", "New Delhi", None),
            pending,
        ]);

        let network = NetworkDirectory::new(vec![
            network_station("net_1", "New Delhi", "Delhi", "Statiq", CONNAUGHT_PLACE, 50.0),
            network_station(
                "net_2",
                "Mumbai",
                "Maharashtra",
                "Tata Power",
                GeoPoint {
                    latitude: 19.0596,
                    longitude: 72.8295,
                },
                30.0,
            ),
        ]);

        AppState::new(
            Arc::new(geocoder),
            directory,
            network,
            SearchSettings::default(),
        )
    }

    pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    pub(crate) fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub(crate) fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_app(test_state());
        let (status, body) = send(app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn test_integration_submit_verify_and_find_station() {
        let app = create_app(test_state());

        let (status, body) = send(
            app.clone(),
            post_json(
                "/stations",
                serde_json::json!({
                    "name": "Karol Bagh Fast Charge",
                    "address": "Pusa Road",
                    "city": "New Delhi",
                    "state": "Delhi",
                    "location": {"latitude": 28.6448, "longitude": 77.1903},
                    "connectorType": "CCS",
                    "powerKw": 60
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: StationResponse = serde_json::from_slice(&body).unwrap();
        let station_id = created.station.id;

        // Not visible until an admin approves it
        let (status, _) = send(app.clone(), get_request(&format!("/stations/{station_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            app.clone(),
            Request::builder()
                .uri(format!("/admin/stations/{station_id}/verify"))
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app,
            get_request("/stations/search/nearby?lat=28.6448&lng=77.1903&radius=5"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let nearby: NearbyResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(nearby.total, 1);
        assert_eq!(nearby.stations[0].station.id, station_id);
        assert_eq!(nearby.stations[0].distance_km, 0.0);
        assert_eq!(nearby.stations[0].source, StationSourceKind::Verified);
    }

    #[tokio::test]
    async fn test_integration_destination_check_uses_both_directories() {
        let app = create_app(test_state());

        let (status, body) = send(
            app,
            post_json(
                "/calculator/destination-check",
                serde_json::json!({
                    "origin": "Connaught Place",
                    "destination": "Gurgaon",
                    "currentRange": 5
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let report: DestinationCheckResponse = serde_json::from_slice(&body).unwrap();
        assert!(!report.check.is_reachable);
        let sources: Vec<_> = report
            .charging_stations
            .iter()
            .map(|s| (s.station.id.as_str(), s.source))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("local_1", StationSourceKind::Verified),
                ("net_1", StationSourceKind::Network)
            ]
        );
    }
}
