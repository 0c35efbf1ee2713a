//! Great-circle distance, shared by every distance computation.

use crate::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Something that can measure the distance between two points.
pub trait DistanceCalculator {
    fn distance_km(&self, from: &GeoPoint, to: &GeoPoint) -> f64;
}

/// Spherical-Earth distance using the haversine formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl DistanceCalculator for Haversine {
    fn distance_km(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        haversine_km(from, to)
    }
}

pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lng / 2.0).sin()
            * (d_lng / 2.0).sin();
    // Rounding can push `a` just past 1 for near-antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Arithmetic midpoint of two points.
///
/// This averages the coordinates rather than following the great circle, so
/// it drifts from the true midpoint on long or east-west routes.
pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    GeoPoint {
        latitude: (a.latitude + b.latitude) / 2.0,
        longitude: (a.longitude + b.longitude) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_same_point_is_zero() {
        let delhi = point(28.6304, 77.2177);
        assert_eq!(haversine_km(&delhi, &delhi), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        let distance = haversine_km(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((distance - expected).abs() < 1e-9);
        assert!((distance - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_known_city_pair() {
        let delhi = point(28.6304, 77.2177);
        let mumbai = point(19.0596, 72.8295);
        let distance = haversine_km(&delhi, &mumbai);
        assert!((distance - 1149.0).abs() < 10.0, "got {distance}");
    }

    #[test]
    fn test_symmetric() {
        let a = point(12.9352, 77.6245);
        let b = point(17.4486, 78.3908);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
        assert_eq!(Haversine.distance_km(&a, &b), haversine_km(&a, &b));
    }

    #[test]
    fn test_near_antipodal_points_stay_finite() {
        let expected = std::f64::consts::PI * EARTH_RADIUS_KM;
        let distance = haversine_km(&point(-87.843, -178.0497), &point(87.843, 1.9503));
        assert!(distance.is_finite());
        assert!((distance - expected).abs() < 1e-3, "got {distance}");

        for i in 0..200 {
            let lat = -89.0 + i as f64 * 0.89;
            let lng = -179.0 + i as f64 * 0.9;
            let distance = haversine_km(&point(lat, lng), &point(-lat, lng + 180.0));
            assert!((distance - expected).abs() < 1e-3, "({lat}, {lng}) gave {distance}");
        }
    }

    #[test]
    fn test_midpoint_averages_coordinates() {
        let mid = midpoint(&point(10.0, 70.0), &point(20.0, 80.0));
        assert_eq!(mid, point(15.0, 75.0));
    }
}
