//! Geodesic distance between annotation locations.
//!
//! The matching engine only needs one capability from geography:
//! "how many meters apart are these two coordinates". That capability
//! sits behind the [`GeoDistance`] trait so tests can substitute a
//! fixed-distance implementation.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
///
/// Entries with unknown location default to [`Location::ORIGIN`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// (0, 0), used when a request or annotation carries no
    /// coordinates.
    pub const ORIGIN: Location = Location {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// Capability interface: geodesic distance in meters.
pub trait GeoDistance: Send + Sync {
    fn distance_meters(&self, a: Location, b: Location) -> f64;
}

/// Great-circle distance on a spherical Earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

impl GeoDistance for Haversine {
    fn distance_meters(&self, a: Location, b: Location) -> f64 {
        let lat1 = a.latitude.to_radians();
        let lat2 = b.latitude.to_radians();
        let dlat = (b.latitude - a.latitude).to_radians();
        let dlon = (b.longitude - a.longitude).to_radians();

        let h = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = Location::new(40.4433, -79.9436);
        assert_eq!(Haversine.distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_small_offset_is_meters() {
        // ~0.0001 deg latitude and longitude at 40N is roughly 14 m.
        let a = Location::new(40.0000, -79.0000);
        let b = Location::new(40.0001, -79.0001);
        let d = Haversine.distance_meters(a, b);
        assert!(d > 5.0 && d < 50.0, "distance was {d}");
    }

    #[test]
    fn test_one_degree_latitude_is_kilometers() {
        let a = Location::new(40.0, -79.0);
        let b = Location::new(41.0, -79.0);
        let d = Haversine.distance_meters(a, b);
        // One degree of latitude is ~111 km.
        assert!((d - 111_195.0).abs() < 500.0, "distance was {d}");
    }

    #[test]
    fn test_symmetry() {
        let a = Location::new(40.0, -79.0);
        let b = Location::new(40.5, -78.5);
        let d1 = Haversine.distance_meters(a, b);
        let d2 = Haversine.distance_meters(b, a);
        assert!((d1 - d2).abs() < 1e-6);
    }
}
