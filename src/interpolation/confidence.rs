//! Confidence tiers derived from the distance to the nearest usable source

use std::fmt;

use serde::{Deserialize, Serialize};

/// How trustworthy an interpolated value is, ordered from least to most confident
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    VeryLow,
    Low,
    Medium,
    High,
    Exact,
}

impl ConfidenceTier {
    /// Fixed caveat shown next to the forecast
    #[must_use]
    pub fn caveat(&self) -> &'static str {
        match self {
            ConfidenceTier::Exact => "direct measurement, no interpolation",
            ConfidenceTier::High => "interpolated from a very close source",
            ConfidenceTier::Medium => "interpolated, moderate confidence",
            ConfidenceTier::Low => "interpolated from distant sources, use cautiously",
            ConfidenceTier::VeryLow => "nearest data is far away; treat as a rough estimate",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Exact => write!(f, "EXACT"),
            ConfidenceTier::High => write!(f, "HIGH"),
            ConfidenceTier::Medium => write!(f, "MEDIUM"),
            ConfidenceTier::Low => write!(f, "LOW"),
            ConfidenceTier::VeryLow => write!(f, "VERY_LOW"),
        }
    }
}

/// Distance thresholds (km) separating the tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceLadder {
    /// Below this: EXACT
    #[serde(default = "default_exact_km")]
    pub exact_km: f64,
    /// Below this: HIGH
    #[serde(default = "default_high_km")]
    pub high_km: f64,
    /// Below this: MEDIUM
    #[serde(default = "default_medium_km")]
    pub medium_km: f64,
    /// Up to and including this: LOW; beyond it VERY_LOW
    #[serde(default = "default_low_km")]
    pub low_km: f64,
}

fn default_exact_km() -> f64 {
    0.5
}

fn default_high_km() -> f64 {
    1.0
}

fn default_medium_km() -> f64 {
    20.0
}

fn default_low_km() -> f64 {
    50.0
}

impl Default for ConfidenceLadder {
    fn default() -> Self {
        Self {
            exact_km: default_exact_km(),
            high_km: default_high_km(),
            medium_km: default_medium_km(),
            low_km: default_low_km(),
        }
    }
}

impl ConfidenceLadder {
    /// Tier for the distance to the nearest valid-contributing source
    #[must_use]
    pub fn classify(&self, nearest_valid_km: f64) -> ConfidenceTier {
        match nearest_valid_km {
            d if d < self.exact_km => ConfidenceTier::Exact,
            d if d < self.high_km => ConfidenceTier::High,
            d if d < self.medium_km => ConfidenceTier::Medium,
            d if d <= self.low_km => ConfidenceTier::Low,
            _ => ConfidenceTier::VeryLow,
        }
    }

    /// Whether the rungs are positive and strictly increasing
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        let rungs = [self.exact_km, self.high_km, self.medium_km, self.low_km];
        rungs.iter().all(|r| r.is_finite() && *r > 0.0) && rungs.windows(2).all(|w| w[0] < w[1])
    }
}
