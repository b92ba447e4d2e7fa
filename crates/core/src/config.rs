use std::time::Duration;

use nearby_trains_transit::DistanceUnit;
use serde::{Deserialize, Serialize};

use crate::poller::FetchOrdering;

pub const DEFAULT_FEED_BASE_URL: &str = "https://api-v3.amtraker.com/v3";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse poller config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub distance_unit: DistanceUnit,
    pub fetch_ordering: FetchOrdering,
    pub feed_base_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            distance_unit: DistanceUnit::Mile,
            fetch_ordering: FetchOrdering::LastResolvedWins,
            feed_base_url: DEFAULT_FEED_BASE_URL.to_owned(),
            request_timeout_ms: None,
        }
    }
}

impl PollerConfig {
    /// Parse a config; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PollerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
