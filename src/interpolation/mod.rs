//! Spatial interpolation of sparse point forecasts
//!
//! - Distance: great-circle distance between points
//! - Candidates: k-nearest source selection within a radius
//! - Sentinel: removal of "no data" readings
//! - Idw: inverse-distance weighting for one cell
//! - Confidence: distance ladder for trust tiers
//! - Aggregator: every parameter at every timestamp of a window

pub mod aggregator;
pub mod candidates;
pub mod confidence;
pub mod distance;
pub mod idw;
pub mod sentinel;

pub use aggregator::{AggregatedForecast, SourceIndex, aggregate};
pub use candidates::{Candidate, select_candidates};
pub use confidence::{ConfidenceLadder, ConfidenceTier};
pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use idw::{IDW_POWER, interpolate};
pub use sentinel::{FilteredReadings, Reading, filter_sentinels};
