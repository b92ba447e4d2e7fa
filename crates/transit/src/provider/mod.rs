//! Train feed providers.

pub mod static_feed;

pub use static_feed::{FeedStep, StaticTrainFeed};
