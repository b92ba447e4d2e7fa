//! Distance and proximity utilities.

pub mod queries;

pub use queries::{distance, haversine_distance, sort_by_distance, DistanceUnit};
