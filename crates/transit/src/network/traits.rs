//! Pluggable networking traits.
//!
//! External crates implement these to provide data fetching capabilities.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::models::{Result, TrainFeedResponse};

/// Fetch raw bytes from a URL
pub trait DataFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

/// Source of the full set of currently tracked trains.
///
/// One call is one request: no pagination, no streaming.
pub trait TrainFeed: Send + Sync {
    fn fetch_all_trains<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<TrainFeedResponse>> + Send + 'a>>;
}

impl<T: TrainFeed + ?Sized> TrainFeed for Arc<T> {
    fn fetch_all_trains<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<TrainFeedResponse>> + Send + 'a>> {
        (**self).fetch_all_trains()
    }
}
