//! Query-level entry point tying interpolation and risk classification together

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::EngineError;
use crate::config::EngineConfig;
use crate::interpolation::{AggregatedForecast, ConfidenceTier, aggregate};
use crate::models::{
    ForecastSample, GeoPoint, Parameter, ParameterSummary, RiskReport, TimeWindow,
};
use crate::risk::{ActivityCategory, AlternativeScanner, RiskClassifier};

/// One point query for one activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub target: GeoPoint,
    pub window: TimeWindow,
    /// Free-text activity, e.g. "hiking" or "beach day"
    pub activity: String,
    /// Parameters to interpolate; all six when omitted
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
}

impl ActivityQuery {
    #[must_use]
    pub fn new(target: GeoPoint, window: TimeWindow, activity: impl Into<String>) -> Self {
        Self {
            target,
            window,
            activity: activity.into(),
            parameters: None,
        }
    }

    #[must_use]
    pub fn requested_parameters(&self) -> Vec<Parameter> {
        self.parameters
            .clone()
            .unwrap_or_else(|| Parameter::ALL.to_vec())
    }
}

/// Non-fatal conditions surfaced next to a successful assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Activity text matched no category; the general table was used
    UnknownActivityCategory { requested: String },
    /// Parameter had no valid value anywhere in the window
    ParameterUnavailable { parameter: Parameter },
    /// Cells of available parameters with no valid data
    MissingCells { count: usize },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::UnknownActivityCategory { requested } => write!(
                f,
                "Unknown activity '{requested}', using general outdoor thresholds"
            ),
            EngineWarning::ParameterUnavailable { parameter } => {
                write!(f, "No valid {parameter} data in the requested window")
            }
            EngineWarning::MissingCells { count } => {
                write!(f, "{count} forecast values were missing and left empty")
            }
        }
    }
}

/// Where the answer was computed and what it was computed from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    pub target: GeoPoint,
    pub coordinates: String,
    pub nearest_source: GeoPoint,
    pub nearest_source_km: f64,
    pub sources_used: usize,
    pub confidence: ConfidenceTier,
    pub caveat: String,
    /// Smallest and largest distance that contributed a valid value
    pub nearest_valid_km: f64,
    pub furthest_valid_km: f64,
    pub interpolation_used: bool,
}

/// Full answer to an [`ActivityQuery`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityAssessment {
    pub location: LocationInfo,
    pub activity: ActivityCategory,
    pub forecast: AggregatedForecast,
    pub forecast_summary: BTreeMap<Parameter, ParameterSummary>,
    pub report: RiskReport,
    pub warnings: Vec<EngineWarning>,
    pub generated_at: DateTime<Utc>,
}

/// Stateless engine; cheap to clone and share across threads
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: Arc<EngineConfig>,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RiskEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Interpolated series for every requested parameter
    pub fn interpolate(
        &self,
        target: &GeoPoint,
        window: &TimeWindow,
        parameters: &[Parameter],
        samples: &[ForecastSample],
    ) -> crate::Result<AggregatedForecast> {
        aggregate(
            target,
            window,
            parameters,
            samples,
            &self.config.interpolation,
            &self.config.confidence,
        )
    }

    /// Risk report for an already aggregated forecast, alternatives included
    #[must_use]
    pub fn classify(&self, forecast: &AggregatedForecast, activity: ActivityCategory) -> RiskReport {
        let rules = self.config.thresholds(activity);
        let settings = &self.config.risk;
        let classifier = RiskClassifier::new(&rules, settings.extreme_hazard_count);

        let verdict = classifier.classify(&forecast.series);
        let alternatives = if verdict.suitable() {
            Vec::new()
        } else {
            AlternativeScanner::new(
                &classifier,
                settings.alternative_block_hours,
                settings.max_alternatives,
            )
            .scan(&forecast.window, &forecast.series, &verdict)
        };

        verdict.into_report(alternatives)
    }

    /// Answer a query end to end
    #[instrument(skip(self, query, samples), fields(activity = %query.activity))]
    pub fn assess(
        &self,
        query: &ActivityQuery,
        samples: &[ForecastSample],
    ) -> crate::Result<ActivityAssessment> {
        let mut warnings = Vec::new();

        let matched = ActivityCategory::resolve(&query.activity);
        if !matched.recognized {
            let warning = EngineWarning::UnknownActivityCategory {
                requested: query.activity.clone(),
            };
            warn!("{warning}");
            warnings.push(warning);
        }

        let forecast = self.interpolate(
            &query.target,
            &query.window,
            &query.requested_parameters(),
            samples,
        )?;

        warnings.extend(
            forecast
                .unavailable_parameters
                .iter()
                .map(|&parameter| EngineWarning::ParameterUnavailable { parameter }),
        );
        if forecast.failed_cells > 0 {
            warnings.push(EngineWarning::MissingCells {
                count: forecast.failed_cells,
            });
        }

        let rules = self.config.thresholds(matched.category);
        let forecast_summary = RiskClassifier::new(&rules, self.config.risk.extreme_hazard_count)
            .summarize(&forecast.series);
        let report = self.classify(&forecast, matched.category);

        info!(
            "Assessed {} at {}: {} risk, {} confidence, {} alternatives",
            matched.category,
            query.target.format_coordinates(),
            report.risk_level,
            forecast.confidence,
            report.alternative_windows.len()
        );

        let nearest = forecast
            .candidates
            .first()
            .ok_or(EngineError::NoCandidatesInRange {
                latitude: query.target.latitude,
                longitude: query.target.longitude,
                radius_km: self.config.interpolation.max_radius_km,
            })?;
        let location = LocationInfo {
            target: query.target,
            coordinates: query.target.format_coordinates(),
            nearest_source: nearest.point,
            nearest_source_km: nearest.distance_km,
            sources_used: forecast.candidates.len(),
            confidence: forecast.confidence,
            caveat: forecast.caveat.clone(),
            nearest_valid_km: forecast.nearest_distance_km,
            furthest_valid_km: forecast.furthest_distance_km,
            interpolation_used: forecast.interpolation_used,
        };

        Ok(ActivityAssessment {
            location,
            activity: matched.category,
            forecast,
            forecast_summary,
            report,
            warnings,
            generated_at: Utc::now(),
        })
    }
}
