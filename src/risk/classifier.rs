//! Threshold evaluation of an aggregated forecast for one activity

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::thresholds::{ActivityThresholds, Trigger};
use crate::models::{
    AlternativeWindow, Breach, Hazard, HourlyRisk, Parameter, ParameterSeries, ParameterSummary,
    RiskLevel, RiskReport, Severity,
};

/// Result of classifying one set of series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub risk_level: RiskLevel,
    /// Deduplicated hazards, most severe first, then chronological
    pub hazards: Vec<Hazard>,
    /// Worst severity per timestamp
    pub hourly: Vec<HourlyRisk>,
}

impl Classification {
    #[must_use]
    pub fn suitable(&self) -> bool {
        self.risk_level.is_suitable()
    }

    #[must_use]
    pub fn concerns(&self) -> Vec<String> {
        self.hazards.iter().map(ToString::to_string).collect()
    }

    /// Final report with the scanner's suggestions attached
    #[must_use]
    pub fn into_report(self, alternative_windows: Vec<AlternativeWindow>) -> RiskReport {
        RiskReport {
            suitable: self.suitable(),
            risk_level: self.risk_level,
            concerns: self.concerns(),
            recommendation: self.risk_level.recommendation().to_string(),
            hazards: self.hazards,
            alternative_windows,
            hourly: self.hourly,
        }
    }
}

/// Applies one activity's threshold table to forecast series
#[derive(Debug, Clone)]
pub struct RiskClassifier<'a> {
    rules: &'a ActivityThresholds,
    extreme_hazard_count: usize,
}

impl<'a> RiskClassifier<'a> {
    #[must_use]
    pub fn new(rules: &'a ActivityThresholds, extreme_hazard_count: usize) -> Self {
        Self {
            rules,
            extreme_hazard_count,
        }
    }

    /// Evaluate every valid value against its rule. Cells without data and
    /// parameters without a rule never trigger anything.
    #[must_use]
    pub fn classify(&self, series: &[ParameterSeries]) -> Classification {
        let mut hazards: HashMap<(Parameter, Breach), Hazard> = HashMap::new();
        let mut hourly: BTreeMap<DateTime<Utc>, Severity> = BTreeMap::new();

        for s in series {
            let rule = self.rules.get(&s.parameter);

            for point in &s.points {
                let trigger = rule.zip(point.estimate.as_ref()).and_then(|(rule, estimate)| {
                    rule.evaluate(estimate.value).map(|t| (t, estimate.value))
                });

                let worst = hourly.entry(point.timestamp).or_insert(Severity::Safe);
                if let Some((trigger, value)) = trigger {
                    *worst = (*worst).max(trigger.severity);
                    record(&mut hazards, s.parameter, trigger, value, point.timestamp);
                }
            }
        }

        let mut hazards: Vec<Hazard> = hazards.into_values().collect();
        hazards.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.first_at.cmp(&b.first_at))
                .then(a.parameter.cmp(&b.parameter))
                .then(a.breach.cmp(&b.breach))
        });

        let risk_level = self.risk_level(&hazards);
        debug!("Classified {} hazards as {}", hazards.len(), risk_level);

        Classification {
            risk_level,
            hazards,
            hourly: hourly
                .into_iter()
                .map(|(timestamp, severity)| HourlyRisk {
                    timestamp,
                    severity,
                })
                .collect(),
        }
    }

    /// LOW without hazards, MEDIUM for caution only, HIGH for one unsafe
    /// hazard and EXTREME from `extreme_hazard_count` unsafe hazards upwards
    #[must_use]
    pub fn risk_level(&self, hazards: &[Hazard]) -> RiskLevel {
        let unsafe_count = hazards
            .iter()
            .filter(|h| h.severity == Severity::Unsafe)
            .count();

        match unsafe_count {
            n if n >= self.extreme_hazard_count => RiskLevel::Extreme,
            0 if hazards.is_empty() => RiskLevel::Low,
            0 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    /// Per-parameter statistics with the timestamps that reached CAUTION or worse
    #[must_use]
    pub fn summarize(&self, series: &[ParameterSeries]) -> BTreeMap<Parameter, ParameterSummary> {
        series
            .iter()
            .filter_map(|s| {
                let (min, max, avg, count) = s.stats()?;
                let extreme_hours = match self.rules.get(&s.parameter) {
                    Some(rule) => s
                        .valid_points()
                        .filter(|(_, e)| rule.severity(e.value) >= Severity::Caution)
                        .map(|(ts, _)| ts)
                        .collect(),
                    None => Vec::new(),
                };
                Some((
                    s.parameter,
                    ParameterSummary {
                        min,
                        max,
                        avg,
                        count,
                        extreme_hours,
                    },
                ))
            })
            .collect()
    }
}

fn record(
    hazards: &mut HashMap<(Parameter, Breach), Hazard>,
    parameter: Parameter,
    trigger: Trigger,
    value: f64,
    at: DateTime<Utc>,
) {
    let hazard = hazards
        .entry((parameter, trigger.breach))
        .or_insert_with(|| Hazard {
            parameter,
            severity: trigger.severity,
            breach: trigger.breach,
            threshold: trigger.threshold,
            worst_value: value,
            worst_at: at,
            first_at: at,
        });

    if trigger.severity > hazard.severity {
        hazard.severity = trigger.severity;
        hazard.threshold = trigger.threshold;
    }
    let worse = match trigger.breach {
        Breach::Above => value > hazard.worst_value,
        Breach::Below => value < hazard.worst_value,
    };
    if worse {
        hazard.worst_value = value;
        hazard.worst_at = at;
    }
    if at < hazard.first_at {
        hazard.first_at = at;
    }
}
