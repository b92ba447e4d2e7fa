//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use std::cmp::Ordering;

use geo::HaversineDistance;
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, Positioned};

const METERS_PER_KILOMETER: f64 = 1_000.0;
const METERS_PER_MILE: f64 = 1_609.344;
const METERS_PER_NAUTICAL_MILE: f64 = 1_852.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Meter,
    Kilometer,
    #[default]
    Mile,
    NauticalMile,
}

impl DistanceUnit {
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meter => meters,
            DistanceUnit::Kilometer => meters / METERS_PER_KILOMETER,
            DistanceUnit::Mile => meters / METERS_PER_MILE,
            DistanceUnit::NauticalMile => meters / METERS_PER_NAUTICAL_MILE,
        }
    }
}

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    a.to_point().haversine_distance(&b.to_point())
}

/// Great-circle distance between two coordinates in `unit`.
///
/// Out-of-range input is not rejected; the result is whatever the formula
/// yields for it.
pub fn distance(a: Coordinate, b: Coordinate, unit: DistanceUnit) -> f64 {
    unit.from_meters(haversine_distance(a, b))
}

/// Stable ascending sort by distance from `origin`.
///
/// Equal distances keep their incoming order, and NaN distances (from
/// non-finite positions) sort last.
pub fn sort_by_distance<T: Positioned>(
    items: &mut Vec<T>,
    origin: Coordinate,
    unit: DistanceUnit,
) {
    let mut keyed: Vec<(f64, T)> = items
        .drain(..)
        .map(|item| (distance(origin, item.coordinate(), unit), item))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare_distance(*a, *b));

    items.extend(keyed.into_iter().map(|(_, item)| item));
}

fn compare_distance(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.total_cmp(&b),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}
