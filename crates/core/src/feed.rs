//! HTTP client for the live train feed.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use nearby_trains_transit::{DataFetcher, Result, TrainFeed, TrainFeedResponse, TransitError};
use tracing::debug;

use crate::config::PollerConfig;

/// [`DataFetcher`] over a shared `reqwest` client
#[derive(Clone, Debug, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransitError::Network(e.to_string()))?;

        Ok(Self { client })
    }
}

impl DataFetcher for ReqwestFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|e| TransitError::Network(e.to_string()))?;

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransitError::Network(e.to_string()))?;

            Ok(bytes.to_vec())
        })
    }
}

/// Amtraker v3 feed: `GET <base>/trains` answers with every tracked train,
/// grouped by train number.
pub struct AmtrakerFeed<F> {
    fetcher: F,
    trains_url: String,
}

impl<F: DataFetcher> AmtrakerFeed<F> {
    pub fn new(fetcher: F, base_url: &str) -> Self {
        Self {
            fetcher,
            trains_url: format!("{}/trains", base_url.trim_end_matches('/')),
        }
    }

    pub fn trains_url(&self) -> &str {
        &self.trains_url
    }
}

impl AmtrakerFeed<ReqwestFetcher> {
    pub fn from_config(config: &PollerConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(config.request_timeout())?;
        Ok(Self::new(fetcher, &config.feed_base_url))
    }
}

impl<F: DataFetcher> TrainFeed for AmtrakerFeed<F> {
    fn fetch_all_trains<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<TrainFeedResponse>> + Send + 'a>> {
        Box::pin(async move {
            let bytes = self.fetcher.fetch(&self.trains_url).await?;
            let response: TrainFeedResponse = serde_json::from_slice(&bytes)?;
            debug!(
                "feed returned {} trains in {} groups",
                response.train_count(),
                response.groups().len()
            );
            Ok(response)
        })
    }
}
