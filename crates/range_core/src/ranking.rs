use crate::calculator::round1;
use crate::geo::{DistanceCalculator, Haversine};
use crate::{GeoPoint, RankedStation, StationRecord, StationSourceKind};

/// Orders stations by distance from a reference point.
#[derive(Debug, Clone, Default)]
pub struct NearestStationRanker<D = Haversine> {
    calculator: D,
}

impl NearestStationRanker<Haversine> {
    pub fn new() -> Self {
        NearestStationRanker {
            calculator: Haversine,
        }
    }
}

impl<D: DistanceCalculator> NearestStationRanker<D> {
    pub fn with_calculator(calculator: D) -> Self {
        NearestStationRanker { calculator }
    }

    /// Measure every locatable station, rounded to one decimal.
    ///
    /// Stations without a usable location are dropped here, never counted as
    /// being at distance 0.
    fn measure(
        &self,
        reference: &GeoPoint,
        stations: &[StationRecord],
        source: StationSourceKind,
        radius_km: f64,
    ) -> Vec<RankedStation> {
        stations
            .iter()
            .filter_map(|station| {
                let location = station.location.filter(GeoPoint::is_finite)?;
                let distance_km = round1(self.calculator.distance_km(reference, &location));
                (distance_km <= radius_km).then(|| RankedStation {
                    station: station.clone(),
                    distance_km,
                    source,
                })
            })
            .collect()
    }

    /// Return at most `limit` stations within `radius_km`, closest first.
    ///
    /// Ties keep their input order.
    pub fn rank_nearby(
        &self,
        reference: &GeoPoint,
        stations: &[StationRecord],
        source: StationSourceKind,
        radius_km: f64,
        limit: usize,
    ) -> Vec<RankedStation> {
        let ranked = self.measure(reference, stations, source, radius_km);
        sort_and_truncate(ranked, limit)
    }

    /// Rank several collections against the same reference point and merge
    /// them into one ranking.
    ///
    /// Collections are never deduplicated against each other; on equal
    /// distance, earlier collections come first.
    pub fn rank_merged<'a, I>(
        &self,
        reference: &GeoPoint,
        collections: I,
        radius_km: f64,
        limit: usize,
    ) -> Vec<RankedStation>
    where
        I: IntoIterator<Item = (StationSourceKind, &'a [StationRecord])>,
    {
        let merged = collections
            .into_iter()
            .flat_map(|(source, stations)| {
                self.rank_nearby(reference, stations, source, radius_km, limit)
            })
            .collect();
        sort_and_truncate(merged, limit)
    }
}

fn sort_and_truncate(mut ranked: Vec<RankedStation>, limit: usize) -> Vec<RankedStation> {
    // `sort_by` is stable, which keeps ties in input order.
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(limit);
    ranked
}
