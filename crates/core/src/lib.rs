pub mod config;
pub mod feed;
pub mod location;
pub mod poller;

// Re-export the data model from the transit crate
pub use nearby_trains_transit as transit;

pub use config::{ConfigError, PollerConfig};
pub use feed::{AmtrakerFeed, ReqwestFetcher};
pub use location::{CoordinateProvider, LocationError, LocationService, PermissionStatus};
pub use poller::{AppState, PollerDriver, PollerHandle, TrainPoller, TrainSnapshot};
