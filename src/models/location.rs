//! Geographic point model used for targets and forecast sources

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Coordinates closer than this (in degrees, per axis) are the same point
pub const IDENTITY_EPSILON_DEG: f64 = 1e-6;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees (-90..90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180..180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validate(&self) -> crate::Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(EngineError::invalid_coordinate(format!(
                "latitude {} is outside -90..90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(EngineError::invalid_coordinate(format!(
                "longitude {} is outside -180..180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Whether both coordinates match within [`IDENTITY_EPSILON_DEG`]
    #[must_use]
    pub fn is_identical(&self, other: &GeoPoint) -> bool {
        (self.latitude - other.latitude).abs() <= IDENTITY_EPSILON_DEG
            && (self.longitude - other.longitude).abs() <= IDENTITY_EPSILON_DEG
    }

    /// Quantized key used to group samples by source point
    #[must_use]
    pub(crate) fn grid_key(&self) -> (i64, i64) {
        let scale = 1.0 / IDENTITY_EPSILON_DEG;
        (
            (self.latitude * scale).round() as i64,
            (self.longitude * scale).round() as i64,
        )
    }

    /// Format point as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_valid_range() {
        assert!(GeoPoint::new(7.07, 125.61).is_ok());
        assert!(GeoPoint::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        let err = GeoPoint::new(91.0, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCoordinate { .. }));

        let err = GeoPoint::new(0.0, -180.5).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCoordinate { .. }));

        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_identical_within_epsilon() {
        let a = GeoPoint::new(40.71, -74.01).unwrap();
        let b = GeoPoint::new(40.710_000_4, -74.009_999_7).unwrap();
        let c = GeoPoint::new(40.7101, -74.01).unwrap();
        assert!(a.is_identical(&b));
        assert!(!a.is_identical(&c));
    }

    #[test]
    fn test_grid_key_groups_identical_points() {
        let a = GeoPoint::new(14.6, 120.98).unwrap();
        let b = GeoPoint::new(14.600_000_000_1, 120.98).unwrap();
        assert_eq!(a.grid_key(), b.grid_key());
        assert_eq!(a.format_coordinates(), "14.6000, 120.9800");
    }
}
