//! Activity-aware risk classification
//!
//! - Thresholds: activity categories and their per-parameter rules
//! - Classifier: hazards, overall risk level and hourly timeline for a set of series
//! - Alternatives: safer sub-windows when the requested window is unsuitable

pub mod alternatives;
pub mod classifier;
pub mod thresholds;

pub use alternatives::{AlternativeScanner, improvement_reason};
pub use classifier::{Classification, RiskClassifier};
pub use thresholds::{
    ActivityCategory, ActivityMatch, ActivityThresholds, Band, ThresholdRule, ThresholdTables,
    Trigger, default_tables, default_thresholds,
};
