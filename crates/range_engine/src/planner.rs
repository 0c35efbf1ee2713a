use std::sync::Arc;

use range_core::{
    GeoPoint, NearestStationRanker, RankedStation, ReachabilityReport, StationRecord,
    StationSourceKind, ValidationError, Validator, VehicleProfile, check_reachability,
    haversine_km, midpoint,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geocode::{Geocoder, GeocoderError};
use crate::source::{StationFilters, StationSource};

/// Which end of a route a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEnd {
    Origin,
    Destination,
}

impl std::fmt::Display for RouteEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteEnd::Origin => write!(f, "origin"),
            RouteEnd::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GeocodingError {
    #[error("Origin address not found")]
    OriginNotFound,
    #[error("Destination address not found")]
    DestinationNotFound,
    #[error("Error geocoding {endpoint} address")]
    Unavailable {
        endpoint: RouteEnd,
        #[source]
        cause: GeocoderError,
    },
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
}

/// Radius and size of station searches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    pub radius_km: f64,
    pub limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            radius_km: 50.0,
            limit: 10,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        validator.check(
            self.radius_km.is_finite() && self.radius_km >= 0.0,
            "radius",
            "Radius must be a non-negative number",
        );
        validator.finish()
    }
}

/// A trip between two named places.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    /// The origin may be a literal `"lat,lng"` pair from the device.
    pub use_current_location: bool,
    pub range_km: f64,
    pub profile: VehicleProfile,
}

impl RouteQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::default();
        validator.check(
            !self.origin.trim().is_empty(),
            "origin",
            "Origin is required",
        );
        validator.check(
            !self.destination.trim().is_empty(),
            "destination",
            "Destination is required",
        );
        validator.check(
            self.range_km.is_finite() && self.range_km >= 0.0,
            "currentRange",
            "Current range must be positive",
        );
        validator.merge(self.profile.validate());
        validator.finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DestinationReport {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance_km: f64,
    pub range_km: f64,
    pub reachability: ReachabilityReport,
    /// Charging stops around the route midpoint, empty when reachable.
    pub charging_stations: Vec<RankedStation>,
}

/// Answers reachability questions and proposes charging stops.
pub struct RoutePlanner {
    geocoder: Arc<dyn Geocoder>,
    sources: Vec<Arc<dyn StationSource>>,
    ranker: NearestStationRanker,
    search: SearchSettings,
}

impl RoutePlanner {
    /// Sources are consulted in order; earlier sources win distance ties.
    pub fn new(geocoder: Arc<dyn Geocoder>, sources: Vec<Arc<dyn StationSource>>) -> Self {
        RoutePlanner {
            geocoder,
            sources,
            ranker: NearestStationRanker::new(),
            search: SearchSettings::default(),
        }
    }

    pub fn with_search(mut self, search: SearchSettings) -> Self {
        self.search = search;
        self
    }

    pub fn search_settings(&self) -> SearchSettings {
        self.search
    }

    async fn resolve(
        &self,
        place: &str,
        accept_coordinates: bool,
    ) -> Result<Option<GeoPoint>, GeocoderError> {
        if accept_coordinates {
            if let Ok(point) = place.parse::<GeoPoint>() {
                return Ok(Some(point));
            }
        }
        self.geocoder.geocode(place).await
    }

    /// Geocode both ends of the route. The lookups run concurrently; an
    /// origin failure is reported ahead of a destination failure.
    pub async fn resolve_route(
        &self,
        query: &RouteQuery,
    ) -> Result<(GeoPoint, GeoPoint), GeocodingError> {
        let (origin, destination) = tokio::join!(
            self.resolve(&query.origin, query.use_current_location),
            self.resolve(&query.destination, false),
        );

        let origin = match origin {
            Ok(Some(point)) => point,
            Ok(None) => return Err(GeocodingError::OriginNotFound),
            Err(cause) => {
                return Err(GeocodingError::Unavailable {
                    endpoint: RouteEnd::Origin,
                    cause,
                });
            }
        };
        let destination = match destination {
            Ok(Some(point)) => point,
            Ok(None) => return Err(GeocodingError::DestinationNotFound),
            Err(cause) => {
                return Err(GeocodingError::Unavailable {
                    endpoint: RouteEnd::Destination,
                    cause,
                });
            }
        };
        Ok((origin, destination))
    }

    /// Check whether the destination is reachable, geocoding both place names
    /// first. Charging stops are suggested when it is not.
    pub async fn check_reachability_by_names(
        &self,
        query: &RouteQuery,
    ) -> Result<DestinationReport, PlannerError> {
        query.validate()?;

        let (origin, destination) = self.resolve_route(query).await.inspect_err(|e| {
            tracing::warn!("Could not resolve route: {}", e);
        })?;
        let distance_km = haversine_km(&origin, &destination);
        let reachability = check_reachability(distance_km, query.range_km, &query.profile)?;

        let charging_stations = if reachability.is_reachable {
            Vec::new()
        } else {
            self.suggest_stations(&origin, &destination).await
        };

        tracing::info!(
            "Route {:?} -> {:?}: {:.1} km, reachable: {}, {} station(s) suggested",
            query.origin,
            query.destination,
            distance_km,
            reachability.is_reachable,
            charging_stations.len()
        );

        Ok(DestinationReport {
            origin,
            destination,
            distance_km,
            range_km: query.range_km,
            reachability,
            charging_stations,
        })
    }

    /// Stations near the straight-line midpoint of the route, merged across
    /// every source.
    pub async fn suggest_stations(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> Vec<RankedStation> {
        let reference = midpoint(origin, destination);
        let listings = self.collect_listings(None, &StationFilters::default()).await;
        self.ranker.rank_merged(
            &reference,
            listings
                .iter()
                .map(|(kind, stations)| (*kind, stations.as_slice())),
            self.search.radius_km,
            self.search.limit,
        )
    }

    /// Stations around a point, from one source or from all of them.
    pub async fn search_nearby(
        &self,
        reference: &GeoPoint,
        only: Option<StationSourceKind>,
        search: &SearchSettings,
    ) -> Result<Vec<RankedStation>, ValidationError> {
        reference.validate("lat", "lng")?;
        search.validate()?;

        let listings = self.collect_listings(only, &StationFilters::default()).await;
        let ranked = self.ranker.rank_merged(
            reference,
            listings
                .iter()
                .map(|(kind, stations)| (*kind, stations.as_slice())),
            search.radius_km,
            search.limit,
        );
        tracing::debug!(
            "{} station(s) within {} km of {:?}",
            ranked.len(),
            search.radius_km,
            reference
        );
        Ok(ranked)
    }

    /// List every selected source. A failing source is logged and skipped so
    /// the others still contribute.
    async fn collect_listings(
        &self,
        only: Option<StationSourceKind>,
        filters: &StationFilters,
    ) -> Vec<(StationSourceKind, Vec<StationRecord>)> {
        let mut listings = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let kind = source.kind();
            if only.is_some_and(|only| only != kind) {
                continue;
            }
            match source.list_stations(filters).await {
                Ok(stations) => listings.push((kind, stations)),
                Err(e) => tracing::warn!("Skipping {} stations: {}", kind, e),
            }
        }
        listings
    }
}
