//! Train feed data models, types, and traits.

pub mod feed;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use feed::{TrainFeedResponse, TrainGroup};
pub use traits::Positioned;
pub use types::{Coordinate, Heading, Result, Train, TrainState, TransitError};
