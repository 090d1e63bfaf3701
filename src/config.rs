//! Configuration management for the spotcast engine
//!
//! Handles loading configuration from a TOML file and `SPOTCAST__*`
//! environment variables, and validates the result before the engine sees it.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::interpolation::ConfidenceLadder;
use crate::risk::{ActivityCategory, ActivityThresholds, ThresholdTables, default_thresholds};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Neighbour selection and interpolation settings
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    /// Distance ladder for confidence tiers
    #[serde(default)]
    pub confidence: ConfidenceLadder,
    /// Risk aggregation settings
    #[serde(default)]
    pub risk: RiskConfig,
    /// Threshold tables per activity category; missing categories fall back to built-ins
    #[serde(default)]
    pub activities: ThresholdTables,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Neighbour selection and interpolation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Number of nearest sources to consider
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
    /// Sources further than this are never used
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
    /// Below this distance the nearest value is used as-is
    #[serde(default = "default_exact_match_km")]
    pub exact_match_km: f64,
}

/// Risk aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Distinct UNSAFE hazards needed for EXTREME
    #[serde(default = "default_extreme_hazard_count")]
    pub extreme_hazard_count: usize,
    /// Length of the sub-windows scanned for alternatives
    #[serde(default = "default_alternative_block_hours")]
    pub alternative_block_hours: u32,
    /// Upper bound on suggested alternatives
    #[serde(default = "default_max_alternatives")]
    pub max_alternatives: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_neighbors() -> usize {
    3
}

fn default_max_radius_km() -> f64 {
    100.0
}

fn default_exact_match_km() -> f64 {
    0.5
}

fn default_extreme_hazard_count() -> usize {
    2
}

fn default_alternative_block_hours() -> u32 {
    3
}

fn default_max_alternatives() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            neighbors: default_neighbors(),
            max_radius_km: default_max_radius_km(),
            exact_match_km: default_exact_match_km(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            extreme_hazard_count: default_extreme_hazard_count(),
            alternative_block_hours: default_alternative_block_hours(),
            max_alternatives: default_max_alternatives(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut config = Self {
            interpolation: InterpolationConfig::default(),
            confidence: ConfidenceLadder::default(),
            risk: RiskConfig::default(),
            activities: HashMap::new(),
            logging: LoggingConfig::default(),
        };
        config.apply_defaults();
        config
    }
}

impl EngineConfig {
    /// Load configuration from `spotcast.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        // SPOTCAST__RISK__MAX_ALTERNATIVES=5 style overrides
        builder = builder.add_source(
            Environment::with_prefix("SPOTCAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        Self::from_settings(settings)
    }

    /// Parse configuration from TOML text, without touching the environment
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .with_context(|| "Failed to parse configuration")?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        // Table keys come out of `config` as plain strings; serde_json maps
        // them onto the category and parameter enums.
        let raw: serde_json::Value = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;
        let mut config: EngineConfig =
            serde_json::from_value(raw).with_context(|| "Invalid configuration structure")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Default configuration file location
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("spotcast.toml")
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        for category in ActivityCategory::ALL {
            self.activities
                .entry(category)
                .or_insert_with(|| default_thresholds(category));
        }
    }

    /// Threshold table for a category
    #[must_use]
    pub fn thresholds(&self, category: ActivityCategory) -> ActivityThresholds {
        self.activities
            .get(&category)
            .cloned()
            .unwrap_or_else(|| default_thresholds(category))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_interpolation()?;
        self.validate_risk()?;
        self.validate_thresholds()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_interpolation(&self) -> Result<()> {
        let interpolation = &self.interpolation;
        if interpolation.neighbors == 0 {
            return Err(EngineError::config("Neighbour count must be at least 1").into());
        }
        if !(interpolation.max_radius_km.is_finite() && interpolation.max_radius_km > 0.0) {
            return Err(EngineError::config("Maximum search radius must be positive").into());
        }
        if !(interpolation.exact_match_km.is_finite() && interpolation.exact_match_km > 0.0) {
            return Err(EngineError::config("Exact match distance must be positive").into());
        }
        if !self.confidence.is_ordered() {
            return Err(EngineError::config(
                "Confidence distances must be positive and strictly increasing (exact < high < medium < low)",
            )
            .into());
        }
        if interpolation.exact_match_km != self.confidence.exact_km {
            return Err(EngineError::config(format!(
                "interpolation.exact_match_km ({}) must equal confidence.exact_km ({})",
                interpolation.exact_match_km, self.confidence.exact_km
            ))
            .into());
        }
        Ok(())
    }

    fn validate_risk(&self) -> Result<()> {
        if self.risk.extreme_hazard_count < 2 {
            return Err(
                EngineError::config("Extreme hazard count must be at least 2").into(),
            );
        }
        if self.risk.alternative_block_hours == 0 {
            return Err(EngineError::config("Alternative block length must be positive").into());
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<()> {
        for (category, rules) in &self.activities {
            for (parameter, rule) in rules {
                rule.validate()
                    .with_context(|| format!("Threshold for {parameter} in {category}"))?;
            }
        }
        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EngineError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
