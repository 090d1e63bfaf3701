//! `spotcast` - Point forecasts and activity risk from sparse weather grids
//!
//! This library interpolates gridded forecasts produced for a sparse set of
//! survey points onto arbitrary coordinates, grades how trustworthy the result
//! is, and turns the interpolated series into an activity-specific risk verdict
//! with safer alternative times.

pub mod config;
pub mod engine;
pub mod error;
pub mod interpolation;
pub mod models;
pub mod risk;

// Re-export core types for public API
pub use config::EngineConfig;
pub use engine::{ActivityAssessment, ActivityQuery, EngineWarning, LocationInfo, RiskEngine};
pub use error::EngineError;
pub use interpolation::{AggregatedForecast, ConfidenceLadder, ConfidenceTier};
pub use models::{ForecastSample, GeoPoint, Parameter, RiskLevel, RiskReport, TimeWindow};
pub use risk::{ActivityCategory, ThresholdRule};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EngineError>;
