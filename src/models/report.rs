//! Risk report model handed to the presentation layer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Parameter;

/// Per-reading classification against a threshold rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Safe,
    Caution,
    Unsafe,
}

/// Overall risk for a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    /// Activities are suitable below HIGH
    #[must_use]
    pub fn is_suitable(&self) -> bool {
        *self < RiskLevel::High
    }

    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Conditions look suitable for this activity.",
            RiskLevel::Medium => "Suitable with precautions; monitor the flagged conditions.",
            RiskLevel::High => "Not recommended during this window.",
            RiskLevel::Extreme => "Avoid this activity during this window.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Extreme => write!(f, "EXTREME"),
        }
    }
}

/// Which side of a threshold a reading crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breach {
    Above,
    Below,
}

/// A triggered hazard: one parameter crossing one threshold in one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub parameter: Parameter,
    pub severity: Severity,
    pub breach: Breach,
    /// The threshold that was crossed
    pub threshold: f64,
    /// Most extreme value observed on the breached side
    pub worst_value: f64,
    pub worst_at: DateTime<Utc>,
    pub first_at: DateTime<Utc>,
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Unsafe => "unsafe",
            Severity::Caution => "caution",
            Severity::Safe => "safe",
        };
        let side = match self.breach {
            Breach::Above => "above",
            Breach::Below => "below",
        };
        let unit = self.parameter.unit();
        write!(
            f,
            "{} {side} {level} threshold {}{unit} (worst {:.1}{unit} at {})",
            self.parameter,
            self.threshold,
            self.worst_value,
            self.worst_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Worst severity across parameters at one timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRisk {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
}

/// Statistics for one parameter over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    /// Timestamps where the value reached CAUTION or worse
    pub extreme_hours: Vec<DateTime<Utc>>,
}

/// A safer sub-window suggested when the requested one is unsuitable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub reason: String,
}

/// Verdict for one activity over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub suitable: bool,
    pub risk_level: RiskLevel,
    /// Hazard descriptions, most severe first, then chronological
    pub concerns: Vec<String>,
    /// Structured form of `concerns`, same order
    pub hazards: Vec<Hazard>,
    pub recommendation: String,
    pub alternative_windows: Vec<AlternativeWindow>,
    pub hourly: Vec<HourlyRisk>,
}
