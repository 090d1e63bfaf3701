//! Search for safer sub-windows when a requested window is unsuitable

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::classifier::{Classification, RiskClassifier};
use crate::models::{
    AlternativeWindow, Breach, Hazard, Parameter, ParameterSeries, Severity, TimeWindow,
};

/// Reason used when no individual hazard clearly went away
pub const FALLBACK_REASON: &str = "fewer weather hazards";

/// Re-classifies fixed, non-overlapping blocks of the original window
#[derive(Debug, Clone)]
pub struct AlternativeScanner<'a> {
    classifier: &'a RiskClassifier<'a>,
    block: Duration,
    max_alternatives: usize,
}

impl<'a> AlternativeScanner<'a> {
    #[must_use]
    pub fn new(classifier: &'a RiskClassifier<'a>, block_hours: u32, max_alternatives: usize) -> Self {
        Self {
            classifier,
            block: Duration::hours(i64::from(block_hours.max(1))),
            max_alternatives,
        }
    }

    /// Blocks rated strictly better than `original`, best first, earliest
    /// first among equals. Empty when the original is already suitable, the
    /// window holds a single block, or nothing improves.
    #[must_use]
    pub fn scan(
        &self,
        window: &TimeWindow,
        series: &[ParameterSeries],
        original: &Classification,
    ) -> Vec<AlternativeWindow> {
        if original.suitable() || self.max_alternatives == 0 {
            return Vec::new();
        }

        let blocks = self.blocks(window, series);
        if blocks.len() < 2 {
            debug!("Window holds a single block, no alternatives to scan");
            return Vec::new();
        }

        let mut better: Vec<AlternativeWindow> = blocks
            .into_iter()
            .filter_map(|(start, end)| {
                let sliced: Vec<ParameterSeries> =
                    series.iter().map(|s| s.slice(start, end)).collect();
                if !sliced.iter().any(ParameterSeries::has_valid_data) {
                    return None;
                }

                let verdict = self.classifier.classify(&sliced);
                (verdict.risk_level < original.risk_level).then(|| AlternativeWindow {
                    start,
                    end,
                    risk_level: verdict.risk_level,
                    reason: improvement_reason(&original.hazards, &verdict.hazards),
                })
            })
            .collect();

        better.sort_by(|a, b| a.risk_level.cmp(&b.risk_level).then(a.start.cmp(&b.start)));
        better.truncate(self.max_alternatives);

        info!(
            "Found {} safer alternative windows than {}",
            better.len(),
            original.risk_level
        );
        better
    }

    /// First and last timestamp of every block that holds at least one point
    fn blocks(
        &self,
        window: &TimeWindow,
        series: &[ParameterSeries],
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let Some(reference) = series.first() else {
            return Vec::new();
        };

        let block_minutes = self.block.num_minutes();
        let mut blocks: Vec<(i64, DateTime<Utc>, DateTime<Utc>)> = Vec::new();

        for point in &reference.points {
            if point.timestamp < window.start || point.timestamp > window.end {
                continue;
            }
            let index = (point.timestamp - window.start).num_minutes() / block_minutes;
            match blocks.last_mut() {
                Some((current, _, end)) if *current == index => *end = point.timestamp,
                _ => blocks.push((index, point.timestamp, point.timestamp)),
            }
        }

        blocks.into_iter().map(|(_, start, end)| (start, end)).collect()
    }
}

/// Name the hazards that eased in a block, at most two, in the order the
/// original report lists them
#[must_use]
pub fn improvement_reason(original: &[Hazard], candidate: &[Hazard]) -> String {
    let mut phrases: Vec<&'static str> = Vec::new();

    for hazard in original {
        let remaining = candidate
            .iter()
            .find(|h| h.parameter == hazard.parameter && h.breach == hazard.breach)
            .map_or(Severity::Safe, |h| h.severity);
        if remaining >= hazard.severity {
            continue;
        }
        let phrase = relief_phrase(hazard.parameter, hazard.breach);
        if !phrases.contains(&phrase) {
            phrases.push(phrase);
        }
    }

    match phrases.as_slice() {
        [] => FALLBACK_REASON.to_string(),
        [only] => (*only).to_string(),
        [first, second, ..] => format!("{first} and {second}"),
    }
}

fn relief_phrase(parameter: Parameter, breach: Breach) -> &'static str {
    match (parameter, breach) {
        (Parameter::Temperature, Breach::Above) => "cooler temperatures",
        (Parameter::Temperature, Breach::Below) => "warmer temperatures",
        (Parameter::Precipitation, _) => "less precipitation",
        (Parameter::WindSpeed, _) => "calmer winds",
        (Parameter::Humidity, Breach::Above) => "lower humidity",
        (Parameter::Humidity, Breach::Below) => "higher humidity",
        (Parameter::SolarRadiation, Breach::Above) => "lower solar load",
        (Parameter::SolarRadiation, Breach::Below) => "more daylight",
        (Parameter::CloudCover, Breach::Above) => "clearer skies",
        (Parameter::CloudCover, Breach::Below) => "more cloud cover",
    }
}
