use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nearby_trains_transit::{Coordinate, Result, TrainFeedResponse};
use serde::{Deserialize, Serialize};

use crate::poller::snapshot::TrainSnapshot;

/// Host application lifecycle as reported by the platform
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AppState {
    Active,
    Inactive,
    Background,
    #[default]
    Unknown,
}

impl AppState {
    pub fn is_foreground(self) -> bool {
        self == AppState::Active
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PollerState {
    #[default]
    Idle,
    Polling,
}

/// Which fetch result wins when requests overlap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrdering {
    /// Every result is applied as it arrives; the last to resolve wins.
    #[default]
    LastResolvedWins,
    /// Only the most recently issued request may update the snapshot.
    LatestRequestOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub enum PollerEvent {
    Lifecycle(AppState),
    Tick,
    CoordinateChanged(Option<Coordinate>),
    FetchCompleted {
        request: RequestId,
        outcome: Result<TrainFeedResponse>,
        completed_at: DateTime<Utc>,
    },
    Shutdown,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollerCommand {
    Fetch(RequestId),
    CancelTimer,
    ArmTimer(Duration),
    Publish(TrainSnapshot),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub fetches_issued: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub snapshots_published: u64,
    pub stale_results_discarded: u64,
}
