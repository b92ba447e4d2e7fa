//! # nearby-trains-transit
//!
//! Live train data model and proximity math.
//!
//! ## Features
//!
//! - **Feed model**: Trains as reported by the live feed, grouped by train number
//! - **Distance**: Haversine great-circle distance in meters, kilometers, miles or nautical miles
//! - **Proximity sort**: Stable nearest-first ordering of anything with a position
//! - **Pluggable networking**: Implement your own data fetching
//!
//! ## Example
//!
//! ```
//! use nearby_trains_transit::prelude::*;
//!
//! let response: TrainFeedResponse = vec![
//!     ("line1", vec![Train::new("A", 40.0, -74.0)]),
//!     ("line2", vec![Train::new("B", 41.0, -75.0)]),
//! ]
//! .into_iter()
//! .collect();
//!
//! let user = Coordinate::new(40.1, -74.1);
//! let mut trains = response.flatten();
//! sort_by_distance(&mut trains, user, DistanceUnit::Mile);
//!
//! assert_eq!(trains[0].train_id.as_str(), "A");
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{feed::*, traits::*, types::*};
    pub use crate::network::traits::*;
    pub use crate::provider::{FeedStep, StaticTrainFeed};
    pub use crate::spatial::{distance, haversine_distance, sort_by_distance, DistanceUnit};
}

pub use prelude::*;
