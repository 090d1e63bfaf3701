//! Error types and handling for the spotcast engine

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Parameter;

/// Main error type for the spotcast engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// No forecast source lies within the search radius of the target
    #[error("No forecast sources within {radius_km} km of ({latitude}, {longitude})")]
    NoCandidatesInRange {
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    },

    /// Every candidate reading for one cell was the sentinel
    #[error("No valid {parameter} data at {timestamp}")]
    NoValidDataAtTimestamp {
        parameter: Parameter,
        timestamp: DateTime<Utc>,
    },

    /// A parameter had no valid reading anywhere in the window
    #[error("Parameter {parameter} has no valid data in the requested window")]
    ParameterUnavailable { parameter: Parameter },

    /// None of the requested parameters produced a single valid value
    #[error("No valid forecast data for any requested parameter")]
    NoValidData,

    /// Malformed latitude or longitude
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// Malformed query window
    #[error("Invalid time window: {message}")]
    InvalidTimeWindow { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl EngineError {
    /// Create a new coordinate error
    pub fn invalid_coordinate<S: Into<String>>(message: S) -> Self {
        Self::InvalidCoordinate {
            message: message.into(),
        }
    }

    /// Create a new time window error
    pub fn invalid_time_window<S: Into<String>>(message: S) -> Self {
        Self::InvalidTimeWindow {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error only affects part of a query and may be absorbed
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            EngineError::NoValidDataAtTimestamp { .. } | EngineError::ParameterUnavailable { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EngineError::NoCandidatesInRange { radius_km, .. } => format!(
                "No forecast data within {radius_km} km of this location. Try a wider radius."
            ),
            EngineError::NoValidDataAtTimestamp { parameter, .. } => {
                format!("Some {parameter} readings are missing for this period.")
            }
            EngineError::ParameterUnavailable { parameter } => {
                format!("{parameter} forecasts are unavailable for this period.")
            }
            EngineError::NoValidData => {
                "No usable forecast data for this location and period.".to_string()
            }
            EngineError::InvalidCoordinate { message } => {
                format!("Invalid coordinates: {message}")
            }
            EngineError::InvalidTimeWindow { message } => {
                format!("Invalid time range: {message}")
            }
            EngineError::Validation { message } => format!("Invalid input: {message}"),
            EngineError::Config { .. } => {
                "Configuration error. Please check your threshold configuration.".to_string()
            }
        }
    }
}
