//! Multi-parameter aggregation over a query window
//!
//! Candidate sources are chosen once per query from geometry alone, then every
//! (parameter, timestamp) cell is filtered and interpolated independently.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::candidates::{Candidate, select_candidates};
use super::confidence::{ConfidenceLadder, ConfidenceTier};
use super::idw;
use super::sentinel::{Reading, filter_sentinels};
use crate::EngineError;
use crate::config::InterpolationConfig;
use crate::models::{
    ForecastSample, GeoPoint, InterpolationMethod, Parameter, ParameterSeries, SeriesPoint,
    TimeWindow,
};

/// Forecast rows grouped by distinct source point
pub struct SourceIndex<'a> {
    points: Vec<GeoPoint>,
    cells: Vec<HashMap<(Parameter, DateTime<Utc>), &'a ForecastSample>>,
    skipped: usize,
}

impl<'a> SourceIndex<'a> {
    /// Group samples by source. Sources keep first-appearance order; for
    /// duplicate cells the first valid row wins.
    #[must_use]
    pub fn build(samples: &'a [ForecastSample]) -> Self {
        let mut positions: HashMap<(i64, i64), usize> = HashMap::new();
        let mut index = SourceIndex {
            points: Vec::new(),
            cells: Vec::new(),
            skipped: 0,
        };

        for sample in samples {
            if sample.source.validate().is_err() {
                index.skipped += 1;
                continue;
            }
            let position = *positions.entry(sample.source.grid_key()).or_insert_with(|| {
                index.points.push(sample.source);
                index.cells.push(HashMap::new());
                index.points.len() - 1
            });

            let slot = index.cells[position]
                .entry((sample.parameter, sample.timestamp))
                .or_insert(sample);
            if !slot.is_valid() && sample.is_valid() {
                *slot = sample;
            }
        }

        if index.skipped > 0 {
            warn!("Skipped {} forecast rows with invalid source coordinates", index.skipped);
        }
        index
    }

    /// Distinct source points in first-appearance order
    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[must_use]
    pub fn sample(
        &self,
        source_index: usize,
        parameter: Parameter,
        timestamp: DateTime<Utc>,
    ) -> Option<&'a ForecastSample> {
        self.cells
            .get(source_index)
            .and_then(|cells| cells.get(&(parameter, timestamp)))
            .copied()
    }
}

/// Interpolated, time-aligned forecast for one target point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedForecast {
    pub target: GeoPoint,
    pub window: TimeWindow,
    /// Sources used for every cell, nearest first
    pub candidates: Vec<Candidate>,
    /// One series per available parameter, in request order
    pub series: Vec<ParameterSeries>,
    /// Requested parameters with no valid value anywhere in the window
    pub unavailable_parameters: Vec<Parameter>,
    /// Cells of available parameters that had no valid data
    pub failed_cells: usize,
    pub confidence: ConfidenceTier,
    pub caveat: String,
    /// Smallest nearest-valid distance over all cells
    pub nearest_distance_km: f64,
    /// Largest contributing distance over all cells
    pub furthest_distance_km: f64,
    /// Whether any cell needed IDW rather than an exact match
    pub interpolation_used: bool,
}

impl AggregatedForecast {
    #[must_use]
    pub fn series_for(&self, parameter: Parameter) -> Option<&ParameterSeries> {
        self.series.iter().find(|s| s.parameter == parameter)
    }
}

/// Interpolate every requested parameter at every window timestamp
pub fn aggregate(
    target: &GeoPoint,
    window: &TimeWindow,
    parameters: &[Parameter],
    samples: &[ForecastSample],
    settings: &InterpolationConfig,
    ladder: &ConfidenceLadder,
) -> crate::Result<AggregatedForecast> {
    target.validate()?;
    let timestamps = window.timestamps()?;

    let mut requested: Vec<Parameter> = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        if !requested.contains(parameter) {
            requested.push(*parameter);
        }
    }
    if requested.is_empty() {
        return Err(EngineError::validation("at least one parameter is required"));
    }

    let index = SourceIndex::build(samples);
    let candidates = select_candidates(
        target,
        index.points(),
        settings.neighbors,
        settings.max_radius_km,
    );
    if candidates.is_empty() {
        return Err(EngineError::NoCandidatesInRange {
            latitude: target.latitude,
            longitude: target.longitude,
            radius_km: settings.max_radius_km,
        });
    }
    debug!(
        "Selected {} of {} sources, nearest {:.2} km",
        candidates.len(),
        index.points().len(),
        candidates[0].distance_km
    );

    let built: Vec<ParameterSeries> = requested
        .par_iter()
        .map(|parameter| {
            build_series(*parameter, &timestamps, &candidates, &index, settings.exact_match_km)
        })
        .collect();

    let mut series = Vec::with_capacity(built.len());
    let mut unavailable_parameters = Vec::new();
    for s in built {
        if s.has_valid_data() {
            series.push(s);
        } else {
            let err = EngineError::ParameterUnavailable {
                parameter: s.parameter,
            };
            warn!("{err}");
            unavailable_parameters.push(s.parameter);
        }
    }

    let estimates = || series.iter().flat_map(|s| s.valid_points().map(|(_, e)| e));
    let nearest_distance_km = estimates()
        .map(|e| e.nearest_distance_km)
        .min_by(f64::total_cmp)
        .ok_or(EngineError::NoValidData)?;
    let furthest_distance_km = estimates()
        .map(|e| e.furthest_distance_km)
        .fold(nearest_distance_km, f64::max);
    let interpolation_used = estimates().any(|e| e.method == InterpolationMethod::Idw);
    let failed_cells: usize = series.iter().map(ParameterSeries::unavailable_count).sum();

    let confidence = ladder.classify(nearest_distance_km);
    info!(
        "Aggregated {} parameters over {} timestamps: {} confidence, nearest {:.2} km, {} failed cells",
        series.len(),
        timestamps.len(),
        confidence,
        nearest_distance_km,
        failed_cells
    );

    Ok(AggregatedForecast {
        target: *target,
        window: *window,
        candidates,
        series,
        unavailable_parameters,
        failed_cells,
        confidence,
        caveat: confidence.caveat().to_string(),
        nearest_distance_km,
        furthest_distance_km,
        interpolation_used,
    })
}

fn build_series(
    parameter: Parameter,
    timestamps: &[DateTime<Utc>],
    candidates: &[Candidate],
    index: &SourceIndex<'_>,
    exact_match_km: f64,
) -> ParameterSeries {
    let points = timestamps
        .iter()
        .map(|&timestamp| {
            let readings = candidates.iter().filter_map(|c| {
                index
                    .sample(c.source_index, parameter, timestamp)
                    .map(|s| Reading::from_sample(s, c.distance_km))
            });
            let filtered = filter_sentinels(readings);

            let estimate = match idw::interpolate(parameter, timestamp, &filtered, exact_match_km) {
                Ok(estimate) => Some(estimate),
                Err(err) => {
                    debug!("{err}");
                    None
                }
            };
            SeriesPoint {
                timestamp,
                estimate,
            }
        })
        .collect();

    ParameterSeries::new(parameter, points)
}
