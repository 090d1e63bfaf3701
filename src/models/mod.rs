//! Data models for the spotcast engine
//!
//! This module contains the query-scoped domain models organized by concern:
//! - Location: Geographic points and identity checks
//! - Forecast: Raw forecast rows, query windows and interpolated series
//! - Report: Risk verdicts, hazards and alternative windows

pub mod forecast;
pub mod location;
pub mod report;

// Re-export all public types for convenient access
pub use forecast::{
    ForecastSample, InterpolationMethod, InterpolationResult, Parameter, ParameterSeries,
    SeriesPoint, TimeWindow, SENTINEL_VALUE, is_sentinel,
};
pub use location::GeoPoint;
pub use report::{
    AlternativeWindow, Breach, Hazard, HourlyRisk, ParameterSummary, RiskLevel, RiskReport,
    Severity,
};
