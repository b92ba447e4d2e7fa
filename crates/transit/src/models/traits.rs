//! Core traits for feed entities.

use crate::models::types::{Coordinate, Train};

/// Anything that sits at a single point on the map
pub trait Positioned {
    fn coordinate(&self) -> Coordinate;
}

impl Positioned for Coordinate {
    fn coordinate(&self) -> Coordinate {
        *self
    }
}

impl Positioned for Train {
    fn coordinate(&self) -> Coordinate {
        Train::coordinate(self)
    }
}

impl<T: Positioned> Positioned for &T {
    fn coordinate(&self) -> Coordinate {
        (**self).coordinate()
    }
}
