//! Inverse-distance weighting for a single parameter at a single timestamp
//!
//! Prediction bounds are blended with the same weights as the value. That is an
//! approximation: the extra uncertainty from estimating between sources is not
//! added, so interpolated intervals are no wider than the source intervals.

use chrono::{DateTime, Utc};

use super::sentinel::{FilteredReadings, Reading};
use crate::EngineError;
use crate::models::{InterpolationMethod, InterpolationResult, Parameter};

/// Distance decay exponent
pub const IDW_POWER: i32 = 2;

/// Interpolate one cell from sentinel-filtered readings.
///
/// Fails with [`EngineError::NoValidDataAtTimestamp`] when nothing survived
/// filtering; a cell is never filled with a made-up zero.
pub fn interpolate(
    parameter: Parameter,
    timestamp: DateTime<Utc>,
    filtered: &FilteredReadings,
    exact_match_km: f64,
) -> crate::Result<InterpolationResult> {
    let sentinel_dropped = filtered.dropped > 0;

    let nearest = filtered
        .readings
        .iter()
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
        .ok_or(EngineError::NoValidDataAtTimestamp {
            parameter,
            timestamp,
        })?;

    if nearest.distance_km < exact_match_km || nearest.distance_km <= 0.0 {
        return Ok(exact(nearest, sentinel_dropped));
    }

    let weights: Vec<f64> = filtered
        .readings
        .iter()
        .map(|r| 1.0 / r.distance_km.powi(IDW_POWER))
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let blend = |field: fn(&Reading) -> f64| -> f64 {
        filtered
            .readings
            .iter()
            .zip(&weights)
            .map(|(r, w)| w * field(r))
            .sum::<f64>()
            / total_weight
    };

    let standard_error = if filtered.readings.iter().all(|r| r.standard_error.is_some()) {
        Some(blend(|r| r.standard_error.unwrap_or_default()))
    } else {
        None
    };

    let furthest_distance_km = filtered
        .readings
        .iter()
        .map(|r| r.distance_km)
        .fold(nearest.distance_km, f64::max);

    Ok(InterpolationResult {
        value: blend(|r| r.value),
        lower: blend(|r| r.lower),
        upper: blend(|r| r.upper),
        standard_error,
        nearest_distance_km: nearest.distance_km,
        furthest_distance_km,
        sentinel_dropped,
        method: InterpolationMethod::Idw,
        sources_used: filtered.readings.len(),
    })
}

fn exact(reading: &Reading, sentinel_dropped: bool) -> InterpolationResult {
    InterpolationResult {
        value: reading.value,
        lower: reading.lower,
        upper: reading.upper,
        standard_error: reading.standard_error,
        nearest_distance_km: reading.distance_km,
        furthest_distance_km: reading.distance_km,
        sentinel_dropped,
        method: InterpolationMethod::ExactMatch,
        sources_used: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::sentinel::filter_sentinels;
    use crate::models::SENTINEL_VALUE;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn reading(distance_km: f64, value: f64) -> Reading {
        Reading {
            distance_km,
            value,
            lower: value - 2.0,
            upper: value + 2.0,
            standard_error: Some(1.0),
        }
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let filtered = filter_sentinels(vec![reading(0.3, 30.0), reading(5.0, 32.0), reading(40.0, 28.0)]);
        let result = interpolate(Parameter::Temperature, ts(), &filtered, 0.5).unwrap();

        assert_eq!(result.method, InterpolationMethod::ExactMatch);
        assert_eq!(result.value, 30.0);
        assert_eq!(result.lower, 28.0);
        assert_eq!(result.sources_used, 1);
    }

    #[test]
    fn test_sentinel_nearest_is_skipped() {
        let filtered = filter_sentinels(vec![
            reading(1.0, SENTINEL_VALUE),
            reading(2.0, 10.0),
            reading(8.0, 20.0),
        ]);
        let result = interpolate(Parameter::Temperature, ts(), &filtered, 0.5).unwrap();

        // weights 1/4 and 1/64
        let expected = (0.25 * 10.0 + 0.015_625 * 20.0) / (0.25 + 0.015_625);
        assert_relative_eq!(result.value, expected, epsilon = 1e-12);
        assert_relative_eq!(result.value, 10.588, epsilon = 0.001);
        assert_eq!(result.nearest_distance_km, 2.0);
        assert_eq!(result.furthest_distance_km, 8.0);
        assert!(result.sentinel_dropped);
        assert_eq!(result.method, InterpolationMethod::Idw);
    }

    #[test]
    fn test_bounds_use_same_weights() {
        let filtered = filter_sentinels(vec![reading(2.0, 10.0), reading(4.0, 14.0)]);
        let result = interpolate(Parameter::Humidity, ts(), &filtered, 0.5).unwrap();

        assert_relative_eq!(result.lower, result.value - 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.upper, result.value + 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.standard_error.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standard_error_requires_every_source() {
        let mut partial = reading(4.0, 14.0);
        partial.standard_error = None;
        let filtered = filter_sentinels(vec![reading(2.0, 10.0), partial]);
        let result = interpolate(Parameter::Humidity, ts(), &filtered, 0.5).unwrap();
        assert_eq!(result.standard_error, None);
    }

    #[test]
    fn test_result_within_contributing_range() {
        let cases = [
            vec![reading(1.5, 3.0), reading(7.0, -4.0), reading(30.0, 11.0)],
            vec![reading(12.0, 800.0), reading(13.0, 820.0)],
            vec![reading(60.0, 0.0), reading(61.0, 0.0), reading(99.0, 0.0)],
        ];

        for readings in cases {
            let min = readings.iter().map(|r| r.value).fold(f64::INFINITY, f64::min);
            let max = readings.iter().map(|r| r.value).fold(f64::NEG_INFINITY, f64::max);
            let filtered = filter_sentinels(readings);
            let result = interpolate(Parameter::SolarRadiation, ts(), &filtered, 0.5).unwrap();
            assert!(result.value >= min - 1e-9 && result.value <= max + 1e-9);
        }
    }

    #[test]
    fn test_empty_cell_is_an_error() {
        let filtered = filter_sentinels(vec![reading(2.0, SENTINEL_VALUE)]);
        let err = interpolate(Parameter::Precipitation, ts(), &filtered, 0.5).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NoValidDataAtTimestamp {
                parameter: Parameter::Precipitation,
                ..
            }
        ));
    }
}
