//! Removal of "no data" readings before any averaging

use serde::{Deserialize, Serialize};

use crate::models::{ForecastSample, is_sentinel};

/// One candidate's reading for a single parameter and timestamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub distance_km: f64,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub standard_error: Option<f64>,
}

impl Reading {
    #[must_use]
    pub fn from_sample(sample: &ForecastSample, distance_km: f64) -> Self {
        Self {
            distance_km,
            value: sample.value,
            lower: sample.lower,
            upper: sample.upper,
            standard_error: sample.standard_error,
        }
    }
}

/// Readings that survived filtering, plus how many were dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredReadings {
    pub readings: Vec<Reading>,
    pub dropped: usize,
}

impl FilteredReadings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Keep readings whose value is real data.
///
/// A kept reading with a sentinel bound gets that bound collapsed onto its
/// value, and a sentinel standard error becomes `None`, so the marker can
/// never leak into an output.
pub fn filter_sentinels<I>(readings: I) -> FilteredReadings
where
    I: IntoIterator<Item = Reading>,
{
    let mut filtered = FilteredReadings::default();

    for reading in readings {
        if is_sentinel(reading.value) {
            filtered.dropped += 1;
            continue;
        }
        filtered.readings.push(Reading {
            lower: if is_sentinel(reading.lower) { reading.value } else { reading.lower },
            upper: if is_sentinel(reading.upper) { reading.value } else { reading.upper },
            standard_error: reading.standard_error.filter(|se| !is_sentinel(*se)),
            ..reading
        });
    }

    filtered
}
