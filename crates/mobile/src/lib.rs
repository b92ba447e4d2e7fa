pub mod location;
pub(crate) mod logging;
pub mod presentation;
pub mod tracker;

pub use location::{GeoPoint, LocationPermission, PlatformLocation};
pub use presentation::{CameraCommand, MapButtons, TrainMarker};
pub use tracker::{
    AppStateKind, TrackerConfig, TrackerError, TrackerStats, TrainSnapshotListener, TrainTracker,
};

uniffi::setup_scaffolding!();

/// Route panics through the logger, with a backtrace.
/// Call this once at startup from Kotlin/Swift
#[uniffi::export]
pub fn init_panic_handler() {
    std::panic::set_hook(Box::new(logging::panic_hook));
}

#[uniffi::export]
pub fn init_logging() {
    logging::setup_logging();
}
