//! Great-circle distance on a spherical Earth

use crate::models::GeoPoint;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers
#[must_use]
pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push sqrt(a) a hair past 1 near antipodes
    let central_angle = 2.0 * a.sqrt().clamp(-1.0, 1.0).asin();

    EARTH_RADIUS_KM * central_angle
}
