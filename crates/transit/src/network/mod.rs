//! Networking boundary for the train feed.

pub mod traits;

pub use traits::{DataFetcher, TrainFeed};
