//! Route planning on top of the range core: station sources, geocoding and
//! charging-stop suggestions.

mod geocode;
mod nominatim;
mod planner;
mod source;

pub use crate::geocode::{FixedGeocoder, Geocoder, GeocoderError};
pub use crate::nominatim::{NominatimConfig, NominatimGeocoder};
pub use crate::planner::{
    DestinationReport, GeocodingError, PlannerError, RouteEnd, RoutePlanner, RouteQuery,
    SearchSettings,
};
pub use crate::source::{
    NetworkDirectory, NetworkSummary, SourceError, StationFilters, StationSource,
    VerifiedDirectory,
};
