//! Foreground-only polling of the live train feed.

pub mod driver;
pub mod machine;
pub mod snapshot;
pub mod state;

pub use driver::{PollerDriver, PollerHandle};
pub use machine::TrainPoller;
pub use snapshot::TrainSnapshot;
pub use state::{
    AppState, FetchOrdering, PollerCommand, PollerEvent, PollerState, PollerStats, RequestId,
};
