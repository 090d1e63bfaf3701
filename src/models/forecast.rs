//! Forecast rows, query windows and interpolated series

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::EngineError;

/// Reserved value marking a missing or invalid forecast reading
pub const SENTINEL_VALUE: f64 = -999.0;

/// Anything at or below this is treated as a sentinel. Real readings never get
/// this low, while legitimate negative temperatures stay above it.
pub const SENTINEL_FLOOR: f64 = -900.0;

/// Upper bound on the number of steps a single query window may contain
pub const MAX_WINDOW_STEPS: usize = 24 * 366;

/// Whether a raw reading is the "no data" marker
#[must_use]
pub fn is_sentinel(value: f64) -> bool {
    !value.is_finite() || value <= SENTINEL_FLOOR
}

/// The six weather variables produced per survey point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    /// Corrected precipitation in mm/h
    Precipitation,
    /// Temperature at 2 m in °C
    Temperature,
    /// Wind speed at 10 m in m/s
    WindSpeed,
    /// Relative humidity at 2 m in %
    Humidity,
    /// All-sky surface shortwave downward irradiance in W/m²
    SolarRadiation,
    /// Total cloud amount in %
    CloudCover,
}

impl Parameter {
    /// All parameters, in canonical order
    pub const ALL: [Parameter; 6] = [
        Parameter::Precipitation,
        Parameter::Temperature,
        Parameter::WindSpeed,
        Parameter::Humidity,
        Parameter::SolarRadiation,
        Parameter::CloudCover,
    ];

    /// Canonical snake_case name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Precipitation => "precipitation",
            Parameter::Temperature => "temperature",
            Parameter::WindSpeed => "wind_speed",
            Parameter::Humidity => "humidity",
            Parameter::SolarRadiation => "solar_radiation",
            Parameter::CloudCover => "cloud_cover",
        }
    }

    /// Measurement unit
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Precipitation => "mm/h",
            Parameter::Temperature => "°C",
            Parameter::WindSpeed => "m/s",
            Parameter::Humidity | Parameter::CloudCover => "%",
            Parameter::SolarRadiation => "W/m²",
        }
    }

    /// NASA POWER variable code the upstream models are trained on
    #[must_use]
    pub fn power_code(&self) -> &'static str {
        match self {
            Parameter::Precipitation => "PRECTOTCORR",
            Parameter::Temperature => "T2M",
            Parameter::WindSpeed => "WS10M",
            Parameter::Humidity => "RH2M",
            Parameter::SolarRadiation => "ALLSKY_SFC_SW_DWN",
            Parameter::CloudCover => "CLOUD_AMT",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Parameter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Parameter::ALL
            .into_iter()
            .find(|p| {
                needle.eq_ignore_ascii_case(p.name()) || needle.eq_ignore_ascii_case(p.power_code())
            })
            .or_else(|| match needle.to_ascii_lowercase().as_str() {
                "wind" | "windspeed" => Some(Parameter::WindSpeed),
                "solar" | "uv" => Some(Parameter::SolarRadiation),
                "cloud" | "clouds" => Some(Parameter::CloudCover),
                "rain" | "precip" => Some(Parameter::Precipitation),
                _ => None,
            })
            .ok_or_else(|| EngineError::validation(format!("unknown weather parameter '{s}'")))
    }
}

/// One forecast row for one source point, timestamp and parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Survey point the forecast was produced for
    pub source: GeoPoint,
    /// Forecast timestamp
    pub timestamp: DateTime<Utc>,
    /// Weather variable
    pub parameter: Parameter,
    /// Predicted value, or the sentinel
    pub value: f64,
    /// Lower prediction interval bound
    pub lower: f64,
    /// Upper prediction interval bound
    pub upper: f64,
    /// Standard error of the prediction, when the model reports one
    #[serde(default)]
    pub standard_error: Option<f64>,
}

impl ForecastSample {
    /// Whether the predicted value is usable
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !is_sentinel(self.value)
    }
}

/// Requested time range, sampled at a fixed step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    /// Inclusive end
    pub end: DateTime<Utc>,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: u32,
}

fn default_step_minutes() -> u32 {
    60
}

impl TimeWindow {
    /// Hourly window from `start` to `end` inclusive
    #[must_use]
    pub fn hourly(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            step_minutes: default_step_minutes(),
        }
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    /// Number of hours spanned by the window
    #[must_use]
    pub fn duration_hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.step_minutes == 0 {
            return Err(EngineError::invalid_time_window("step must be positive"));
        }
        if self.end < self.start {
            return Err(EngineError::invalid_time_window(format!(
                "end {} is before start {}",
                self.end, self.start
            )));
        }
        let steps = (self.end - self.start).num_minutes() / i64::from(self.step_minutes);
        if usize::try_from(steps).map_or(true, |s| s >= MAX_WINDOW_STEPS) {
            return Err(EngineError::invalid_time_window(format!(
                "window spans {steps} steps, limit is {MAX_WINDOW_STEPS}"
            )));
        }
        Ok(())
    }

    /// Every timestamp in the window, start and end included
    pub fn timestamps(&self) -> crate::Result<Vec<DateTime<Utc>>> {
        self.validate()?;
        let step = self.step();
        let mut out = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            out.push(current);
            current = current.checked_add_signed(step).ok_or_else(|| {
                EngineError::invalid_time_window(format!(
                    "window runs past the last representable time after {current}"
                ))
            })?;
        }
        Ok(out)
    }
}

/// How a single interpolated value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Target coincides with a source; its value is used directly
    ExactMatch,
    /// Inverse-distance weighted blend of several sources
    Idw,
}

/// Interpolated estimate for one parameter at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationResult {
    pub value: f64,
    /// Lower bound, blended with the same weights as the value
    pub lower: f64,
    /// Upper bound, blended with the same weights as the value
    pub upper: f64,
    /// Only present when every contributing source reported one
    pub standard_error: Option<f64>,
    /// Distance to the nearest source that contributed a valid value
    pub nearest_distance_km: f64,
    /// Distance to the furthest contributing source
    pub furthest_distance_km: f64,
    /// Whether a candidate was skipped because its value was the sentinel
    pub sentinel_dropped: bool,
    pub method: InterpolationMethod,
    pub sources_used: usize,
}

/// One timestamp of a series; `estimate` is `None` when no valid data existed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub estimate: Option<InterpolationResult>,
}

impl SeriesPoint {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.estimate.is_none()
    }
}

/// Time-ordered interpolated values for one parameter, covering every requested timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSeries {
    pub parameter: Parameter,
    pub points: Vec<SeriesPoint>,
}

impl ParameterSeries {
    #[must_use]
    pub fn new(parameter: Parameter, points: Vec<SeriesPoint>) -> Self {
        Self { parameter, points }
    }

    /// Timestamps with a valid estimate, paired with it
    pub fn valid_points(&self) -> impl Iterator<Item = (DateTime<Utc>, &InterpolationResult)> {
        self.points
            .iter()
            .filter_map(|p| p.estimate.as_ref().map(|e| (p.timestamp, e)))
    }

    /// Timestamps flagged as having no valid data
    #[must_use]
    pub fn unavailable_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points
            .iter()
            .filter(|p| p.is_unavailable())
            .map(|p| p.timestamp)
            .collect()
    }

    #[must_use]
    pub fn unavailable_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_unavailable()).count()
    }

    #[must_use]
    pub fn has_valid_data(&self) -> bool {
        self.points.iter().any(|p| p.estimate.is_some())
    }

    #[must_use]
    pub fn value_at(&self, timestamp: DateTime<Utc>) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.timestamp == timestamp)
            .and_then(|p| p.estimate.as_ref())
            .map(|e| e.value)
    }

    /// Points whose timestamp falls in `[start, end]`
    #[must_use]
    pub fn slice(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ParameterSeries {
        ParameterSeries {
            parameter: self.parameter,
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp <= end)
                .cloned()
                .collect(),
        }
    }

    /// Min, max and mean of the valid values, if there are any
    #[must_use]
    pub fn stats(&self) -> Option<(f64, f64, f64, usize)> {
        let values: Vec<f64> = self.valid_points().map(|(_, e)| e.value).collect();
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Some((min, max, avg, values.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, hour, 0, 0).unwrap()
    }

    fn estimate(value: f64) -> InterpolationResult {
        InterpolationResult {
            value,
            lower: value - 1.0,
            upper: value + 1.0,
            standard_error: None,
            nearest_distance_km: 3.0,
            furthest_distance_km: 3.0,
            sentinel_dropped: false,
            method: InterpolationMethod::Idw,
            sources_used: 1,
        }
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(is_sentinel(SENTINEL_VALUE));
        assert!(is_sentinel(-950.0));
        assert!(is_sentinel(f64::NAN));
        assert!(!is_sentinel(-40.0));
        assert!(!is_sentinel(0.0));
    }

    #[test]
    fn test_parameter_parsing_accepts_names_and_codes() {
        assert_eq!("temperature".parse::<Parameter>().unwrap(), Parameter::Temperature);
        assert_eq!("T2M".parse::<Parameter>().unwrap(), Parameter::Temperature);
        assert_eq!("ws10m".parse::<Parameter>().unwrap(), Parameter::WindSpeed);
        assert_eq!("ALLSKY_SFC_SW_DWN".parse::<Parameter>().unwrap(), Parameter::SolarRadiation);
        assert_eq!("wind".parse::<Parameter>().unwrap(), Parameter::WindSpeed);
        assert!("pressure".parse::<Parameter>().is_err());
    }

    #[test]
    fn test_window_timestamps_inclusive() {
        let window = TimeWindow::hourly(ts(6), ts(9));
        let stamps = window.timestamps().unwrap();
        assert_eq!(stamps, vec![ts(6), ts(7), ts(8), ts(9)]);
        assert_eq!(window.duration_hours(), 3);
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let window = TimeWindow::hourly(ts(9), ts(6));
        assert!(matches!(
            window.timestamps().unwrap_err(),
            EngineError::InvalidTimeWindow { .. }
        ));

        let zero_step = TimeWindow {
            start: ts(6),
            end: ts(9),
            step_minutes: 0,
        };
        assert!(zero_step.validate().is_err());
    }

    #[test]
    fn test_window_at_end_of_time_is_rejected() {
        let end = DateTime::<Utc>::MAX_UTC;
        let window = TimeWindow::hourly(end - Duration::minutes(30), end);
        assert!(matches!(
            window.timestamps().unwrap_err(),
            EngineError::InvalidTimeWindow { .. }
        ));
    }

    #[test]
    fn test_series_gaps_and_stats() {
        let series = ParameterSeries::new(
            Parameter::Temperature,
            vec![
                SeriesPoint { timestamp: ts(6), estimate: Some(estimate(20.0)) },
                SeriesPoint { timestamp: ts(7), estimate: None },
                SeriesPoint { timestamp: ts(8), estimate: Some(estimate(26.0)) },
            ],
        );

        assert_eq!(series.unavailable_count(), 1);
        assert_eq!(series.unavailable_timestamps(), vec![ts(7)]);
        assert_eq!(series.value_at(ts(8)), Some(26.0));
        assert_eq!(series.value_at(ts(7)), None);

        let (min, max, avg, count) = series.stats().unwrap();
        assert_eq!((min, max, avg, count), (20.0, 26.0, 23.0, 2));

        let sliced = series.slice(ts(7), ts(8));
        assert_eq!(sliced.points.len(), 2);
    }
}
