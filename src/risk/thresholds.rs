//! Activity categories and their per-parameter threshold tables
//!
//! The numbers in the built-in tables are a starting configuration drawn from
//! outdoor safety guidance; deployments are expected to tune them through the
//! `activities` section of the configuration file.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::models::{Breach, Parameter, Severity};

/// Closed set of activity families with their own threshold tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    /// Hiking, trekking and mountain activities
    Hiking,
    /// Beach and water activities
    Beach,
    /// Cycling, running and endurance activities
    Cycling,
    /// Picnics, gatherings, camping and other outdoor events
    OutdoorEvent,
    /// Anything else; deliberately conservative
    General,
}

const HIKING_WORDS: &[&str] = &[
    "hiking", "hike", "trekking", "trek", "mountain", "mountaineering", "climbing", "trail",
    "backpacking",
];
const BEACH_WORDS: &[&str] = &[
    "beach", "swimming", "swim", "surfing", "surf", "snorkeling", "diving", "kayaking", "water",
    "sailing", "boating",
];
const CYCLING_WORDS: &[&str] = &[
    "cycling", "bike", "biking", "running", "run", "jogging", "marathon", "triathlon", "endurance",
];
const EVENT_WORDS: &[&str] = &[
    "event", "picnic", "gathering", "camping", "festival", "wedding", "concert", "party",
    "barbecue", "bbq",
];

/// Outcome of mapping a free-text activity onto a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMatch {
    pub category: ActivityCategory,
    /// False when nothing matched and the general table was substituted
    pub recognized: bool,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        ActivityCategory::Hiking,
        ActivityCategory::Beach,
        ActivityCategory::Cycling,
        ActivityCategory::OutdoorEvent,
        ActivityCategory::General,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ActivityCategory::Hiking => "hiking",
            ActivityCategory::Beach => "beach",
            ActivityCategory::Cycling => "cycling",
            ActivityCategory::OutdoorEvent => "outdoor_event",
            ActivityCategory::General => "general",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            ActivityCategory::Hiking => HIKING_WORDS,
            ActivityCategory::Beach => BEACH_WORDS,
            ActivityCategory::Cycling => CYCLING_WORDS,
            ActivityCategory::OutdoorEvent => EVENT_WORDS,
            ActivityCategory::General => &["general", "outdoor", "outdoors"],
        }
    }

    /// Map a free-text description ("evening trail run", "Beach day") to a category
    #[must_use]
    pub fn resolve(description: &str) -> ActivityMatch {
        let lowered = description.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
            .collect();

        let found = Self::ALL.into_iter().find(|category| {
            tokens
                .iter()
                .any(|t| *t == category.name() || category.keywords().contains(t))
        });

        match found {
            Some(category) => ActivityMatch {
                category,
                recognized: true,
            },
            None => ActivityMatch {
                category: ActivityCategory::General,
                recognized: false,
            },
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inclusive comfortable band for `outside_range` rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn breach(&self, value: f64) -> Option<(Breach, f64)> {
        if value > self.max {
            Some((Breach::Above, self.max))
        } else if value < self.min {
            Some((Breach::Below, self.min))
        } else {
            None
        }
    }
}

/// Threshold rule for one parameter. An omitted `unsafe_threshold` means the
/// parameter can raise CAUTION but never UNSAFE.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum ThresholdRule {
    Above {
        caution_threshold: f64,
        #[serde(default)]
        unsafe_threshold: Option<f64>,
    },
    Below {
        caution_threshold: f64,
        #[serde(default)]
        unsafe_threshold: Option<f64>,
    },
    OutsideRange {
        caution_threshold: Band,
        #[serde(default)]
        unsafe_threshold: Option<Band>,
    },
}

/// A reading that crossed a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub severity: Severity,
    pub breach: Breach,
    pub threshold: f64,
}

impl ThresholdRule {
    #[must_use]
    pub fn above(caution: f64, unsafe_at: Option<f64>) -> Self {
        ThresholdRule::Above {
            caution_threshold: caution,
            unsafe_threshold: unsafe_at,
        }
    }

    #[must_use]
    pub fn below(caution: f64, unsafe_at: Option<f64>) -> Self {
        ThresholdRule::Below {
            caution_threshold: caution,
            unsafe_threshold: unsafe_at,
        }
    }

    #[must_use]
    pub fn outside(caution: Band, unsafe_at: Option<Band>) -> Self {
        ThresholdRule::OutsideRange {
            caution_threshold: caution,
            unsafe_threshold: unsafe_at,
        }
    }

    /// Classify one value; `None` means SAFE
    #[must_use]
    pub fn evaluate(&self, value: f64) -> Option<Trigger> {
        match *self {
            ThresholdRule::Above {
                caution_threshold,
                unsafe_threshold,
            } => {
                if let Some(limit) = unsafe_threshold.filter(|limit| value > *limit) {
                    return Some(Trigger {
                        severity: Severity::Unsafe,
                        breach: Breach::Above,
                        threshold: limit,
                    });
                }
                (value > caution_threshold).then_some(Trigger {
                    severity: Severity::Caution,
                    breach: Breach::Above,
                    threshold: caution_threshold,
                })
            }
            ThresholdRule::Below {
                caution_threshold,
                unsafe_threshold,
            } => {
                if let Some(limit) = unsafe_threshold.filter(|limit| value < *limit) {
                    return Some(Trigger {
                        severity: Severity::Unsafe,
                        breach: Breach::Below,
                        threshold: limit,
                    });
                }
                (value < caution_threshold).then_some(Trigger {
                    severity: Severity::Caution,
                    breach: Breach::Below,
                    threshold: caution_threshold,
                })
            }
            ThresholdRule::OutsideRange {
                caution_threshold,
                unsafe_threshold,
            } => {
                if let Some((breach, threshold)) = unsafe_threshold.and_then(|b| b.breach(value)) {
                    return Some(Trigger {
                        severity: Severity::Unsafe,
                        breach,
                        threshold,
                    });
                }
                caution_threshold
                    .breach(value)
                    .map(|(breach, threshold)| Trigger {
                        severity: Severity::Caution,
                        breach,
                        threshold,
                    })
            }
        }
    }

    /// Severity of one value, SAFE when nothing triggers
    #[must_use]
    pub fn severity(&self, value: f64) -> Severity {
        self.evaluate(value).map_or(Severity::Safe, |t| t.severity)
    }

    /// Reject non-finite numbers and unsafe limits that are milder than caution
    pub fn validate(&self) -> crate::Result<()> {
        let ok = match *self {
            ThresholdRule::Above {
                caution_threshold,
                unsafe_threshold,
            } => {
                caution_threshold.is_finite()
                    && unsafe_threshold.is_none_or(|u| u.is_finite() && u >= caution_threshold)
            }
            ThresholdRule::Below {
                caution_threshold,
                unsafe_threshold,
            } => {
                caution_threshold.is_finite()
                    && unsafe_threshold.is_none_or(|u| u.is_finite() && u <= caution_threshold)
            }
            ThresholdRule::OutsideRange {
                caution_threshold: c,
                unsafe_threshold,
            } => {
                c.min.is_finite()
                    && c.max.is_finite()
                    && c.min <= c.max
                    && unsafe_threshold.is_none_or(|u| {
                        u.min.is_finite() && u.max.is_finite() && u.min <= c.min && u.max >= c.max
                    })
            }
        };

        if ok {
            Ok(())
        } else {
            Err(EngineError::config(format!("inconsistent threshold rule {self:?}")))
        }
    }
}

/// Rules for one activity category, keyed by parameter
pub type ActivityThresholds = BTreeMap<Parameter, ThresholdRule>;

/// Rules for every activity category
pub type ThresholdTables = HashMap<ActivityCategory, ActivityThresholds>;

/// Built-in table for one category
#[must_use]
pub fn default_thresholds(category: ActivityCategory) -> ActivityThresholds {
    use Parameter::*;

    let rules = match category {
        ActivityCategory::Hiking => vec![
            (Temperature, ThresholdRule::above(32.0, Some(35.0))),
            (Precipitation, ThresholdRule::above(2.0, Some(10.0))),
            (WindSpeed, ThresholdRule::above(15.0, Some(20.0))),
            (SolarRadiation, ThresholdRule::above(800.0, Some(1000.0))),
            (Humidity, ThresholdRule::above(85.0, None)),
        ],
        ActivityCategory::Beach => vec![
            (
                Temperature,
                ThresholdRule::outside(Band::new(20.0, 35.0), Some(Band::new(15.0, 40.0))),
            ),
            (Precipitation, ThresholdRule::above(1.0, Some(5.0))),
            (WindSpeed, ThresholdRule::above(10.0, Some(15.0))),
            (SolarRadiation, ThresholdRule::above(700.0, Some(1000.0))),
            (Humidity, ThresholdRule::above(85.0, None)),
        ],
        ActivityCategory::Cycling => vec![
            (
                Temperature,
                ThresholdRule::outside(Band::new(10.0, 30.0), Some(Band::new(0.0, 35.0))),
            ),
            (Precipitation, ThresholdRule::above(1.0, Some(8.0))),
            (WindSpeed, ThresholdRule::above(10.0, Some(17.0))),
            (Humidity, ThresholdRule::above(70.0, None)),
            (SolarRadiation, ThresholdRule::above(600.0, Some(1000.0))),
        ],
        ActivityCategory::OutdoorEvent => vec![
            (
                Temperature,
                ThresholdRule::outside(Band::new(18.0, 33.0), Some(Band::new(5.0, 38.0))),
            ),
            (Precipitation, ThresholdRule::above(0.5, Some(2.0))),
            (WindSpeed, ThresholdRule::above(12.0, Some(18.0))),
            (Humidity, ThresholdRule::outside(Band::new(30.0, 80.0), None)),
            (SolarRadiation, ThresholdRule::above(800.0, Some(1000.0))),
        ],
        ActivityCategory::General => vec![
            (
                Temperature,
                ThresholdRule::outside(Band::new(10.0, 30.0), Some(Band::new(0.0, 35.0))),
            ),
            (Precipitation, ThresholdRule::above(0.5, Some(5.0))),
            (WindSpeed, ThresholdRule::above(10.0, Some(15.0))),
            (SolarRadiation, ThresholdRule::above(800.0, Some(1000.0))),
            (Humidity, ThresholdRule::above(85.0, None)),
        ],
    };

    rules.into_iter().collect()
}

/// Built-in tables for every category
#[must_use]
pub fn default_tables() -> ThresholdTables {
    ActivityCategory::ALL
        .into_iter()
        .map(|category| (category, default_thresholds(category)))
        .collect()
}
