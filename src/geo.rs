use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_KM;
use crate::markers::Marker;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_km(&self, other: &LatLng) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Great-circle distance in km on a sphere of radius 6371 km.
///
/// This is the cosine form of the haversine formula used by the map page, kept
/// as-is so server-side filtering agrees with what the browser would compute.
/// Coordinates are not range-checked.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p = std::f64::consts::PI / 180.0;
    let a = 0.5 - ((lat2 - lat1) * p).cos() / 2.0
        + (lat1 * p).cos() * (lat2 * p).cos() * (1.0 - ((lon2 - lon1) * p).cos()) / 2.0;

    // rounding can push `a` a hair outside [0, 1]
    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Whether `marker` lies within `max_distance_km` of `center`.
pub fn is_visible(marker: &Marker, center: &LatLng, max_distance_km: f64) -> bool {
    center.distance_km(&marker.position) <= max_distance_km
}
