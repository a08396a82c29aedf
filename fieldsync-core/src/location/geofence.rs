//! Great-circle distance and advisory geofence checks.

use serde::{Deserialize, Serialize};

use super::LocationSample;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two (latitude, longitude) points in degrees.
pub fn distance_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

/// A circular zone registered on the server (patrol checkpoint, cleaning area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

impl Zone {
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Zone {
            name: None,
            latitude,
            longitude,
            radius_meters,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Compares a sample against this zone. Advisory only.
    pub fn check(&self, sample: &LocationSample) -> GeofenceCheck {
        let distance = distance_meters(
            (self.latitude, self.longitude),
            (sample.latitude, sample.longitude),
        );
        GeofenceCheck {
            distance_meters: distance,
            radius_meters: self.radius_meters,
            within: distance <= self.radius_meters,
        }
    }
}

/// Outcome of comparing a sample against a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceCheck {
    pub distance_meters: f64,
    pub radius_meters: f64,
    pub within: bool,
}

impl GeofenceCheck {
    /// Human-readable warning when the sample lies outside the zone.
    pub fn warning(&self) -> Option<String> {
        if self.within {
            return None;
        }
        Some(format!(
            "location is {:.0} m from the zone center (allowed radius {:.0} m)",
            self.distance_meters, self.radius_meters
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn clamp_point(lat: f64, lon: f64) -> Option<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        Some((lat % 90.0, lon % 180.0))
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_meters((0.0, 0.0), (0.0, 0.0)), 0.0);
        assert!(distance_meters((-6.2, 106.8), (-6.2, 106.8)).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_latitude() {
        let d = distance_meters((10.0, 20.0), (11.0, 20.0));
        assert!((d - 111_000.0).abs() < 1_110.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points() {
        let d = distance_meters((0.0, 0.0), (0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half_circumference).abs() < 1.0);
    }

    #[test]
    fn test_zone_check_inside_and_outside() {
        let zone = Zone::new(-6.2000, 106.8000, 100.0).with_name("Lobby");

        let near = LocationSample::new(-6.2005, 106.8000, 10.0);
        let check = zone.check(&near);
        assert!(check.within);
        assert!(check.warning().is_none());

        let far = LocationSample::new(-6.2100, 106.8000, 10.0);
        let check = zone.check(&far);
        assert!(!check.within);
        assert!(check.distance_meters > 1_000.0);
        assert!(check.warning().unwrap().contains("allowed radius 100 m"));
    }

    #[quickcheck]
    fn prop_distance_is_symmetric(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> bool {
        match (clamp_point(lat1, lon1), clamp_point(lat2, lon2)) {
            (Some(a), Some(b)) => (distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6,
            _ => true,
        }
    }

    #[quickcheck]
    fn prop_distance_is_bounded(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> bool {
        match (clamp_point(lat1, lon1), clamp_point(lat2, lon2)) {
            (Some(a), Some(b)) => {
                let d = distance_meters(a, b);
                d >= 0.0 && d <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1.0
            }
            _ => true,
        }
    }
}
