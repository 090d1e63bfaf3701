//! Nearest-source search around a target point

use serde::{Deserialize, Serialize};

use super::distance::haversine_km;
use crate::models::GeoPoint;

/// A source point selected for interpolation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Index of the source in the slice passed to [`select_candidates`]
    pub source_index: usize,
    pub point: GeoPoint,
    pub distance_km: f64,
}

/// Up to `k` sources within `max_radius_km` of `target`, nearest first.
///
/// Equal distances keep their input order. An empty result means no data
/// within range; callers decide whether that is fatal.
#[must_use]
pub fn select_candidates(
    target: &GeoPoint,
    sources: &[GeoPoint],
    k: usize,
    max_radius_km: f64,
) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = sources
        .iter()
        .enumerate()
        .map(|(source_index, point)| Candidate {
            source_index,
            point: *point,
            distance_km: haversine_km(target, point),
        })
        .collect();

    // sort_by is stable, so ties stay in input order
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    ranked
        .into_iter()
        .take_while(|c| c.distance_km <= max_radius_km)
        .take(k)
        .collect()
}
