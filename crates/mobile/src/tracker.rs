use std::sync::{Arc, Mutex};

use nearby_trains_core::poller::{FetchOrdering, PollerStats};
use nearby_trains_core::transit::{Coordinate, TrainFeed, TrainIdentifier};
use nearby_trains_core::{
    AmtrakerFeed, AppState, CoordinateProvider, PermissionStatus, PollerConfig, PollerDriver,
    PollerHandle,
};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::location::{ForeignLocation, PlatformLocation};
use crate::presentation::{
    CameraCommand, MapButtons, TrainMarker, fit_all_command, markers_for, recenter_command,
    select_marker_command,
};

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum TrackerError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("failed to start runtime: {0}")]
    Runtime(String),
    #[error("train {0} is not on the map")]
    UnknownTrain(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum AppStateKind {
    Active,
    Inactive,
    Background,
    Unknown,
}

impl From<AppStateKind> for AppState {
    fn from(kind: AppStateKind) -> Self {
        match kind {
            AppStateKind::Active => AppState::Active,
            AppStateKind::Inactive => AppState::Inactive,
            AppStateKind::Background => AppState::Background,
            AppStateKind::Unknown => AppState::Unknown,
        }
    }
}

#[derive(Clone, Debug, uniffi::Record)]
pub struct TrackerConfig {
    pub interval_ms: Option<u64>,
    pub feed_base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    /// Ignore results of requests that were overtaken by a newer one
    pub latest_request_only: bool,
}

impl TryFrom<TrackerConfig> for PollerConfig {
    type Error = TrackerError;

    fn try_from(config: TrackerConfig) -> Result<Self, Self::Error> {
        let defaults = PollerConfig::default();
        let poller_config = PollerConfig {
            interval_ms: config.interval_ms.unwrap_or(defaults.interval_ms),
            feed_base_url: config.feed_base_url.unwrap_or(defaults.feed_base_url),
            request_timeout_ms: config.request_timeout_ms,
            fetch_ordering: if config.latest_request_only {
                FetchOrdering::LatestRequestOnly
            } else {
                FetchOrdering::LastResolvedWins
            },
            ..defaults
        };
        poller_config
            .validate()
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        Ok(poller_config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Record)]
pub struct TrackerStats {
    pub fetches_issued: u64,
    pub fetches_succeeded: u64,
    pub fetches_failed: u64,
    pub snapshots_published: u64,
    /// Results dropped because a newer request had been issued
    pub stale_results_discarded: u64,
}

impl From<PollerStats> for TrackerStats {
    fn from(stats: PollerStats) -> Self {
        Self {
            fetches_issued: stats.fetches_issued,
            fetches_succeeded: stats.fetches_succeeded,
            fetches_failed: stats.fetches_failed,
            snapshots_published: stats.snapshots_published,
            stale_results_discarded: stats.stale_results_discarded,
        }
    }
}

/// Receives every changed train list, nearest first.
#[uniffi::export(with_foreign)]
pub trait TrainSnapshotListener: Send + Sync {
    fn on_trains_updated(&self, markers: Vec<TrainMarker>);
}

#[derive(Default)]
struct UserLocation {
    permission: PermissionStatus,
    coordinate: Option<Coordinate>,
}

type SharedProvider = Arc<tokio::sync::Mutex<CoordinateProvider<ForeignLocation>>>;

#[derive(uniffi::Object)]
pub struct TrainTracker {
    // Declared first so the poller handle drops before the runtime it runs on.
    poller: Arc<PollerHandle>,
    user: Arc<Mutex<UserLocation>>,
    provider: Mutex<Option<SharedProvider>>,
    listener_task: Mutex<Option<JoinHandle<()>>>,
    runtime: Runtime,
}

#[uniffi::export]
impl TrainTracker {
    #[uniffi::constructor]
    pub fn new(config: TrackerConfig) -> Result<Arc<Self>, TrackerError> {
        let config = PollerConfig::try_from(config)?;
        Self::from_poller_config(config)
    }

    /// Build from a JSON poller config; absent keys keep their defaults.
    #[uniffi::constructor]
    pub fn with_json_config(json: String) -> Result<Arc<Self>, TrackerError> {
        let config =
            PollerConfig::from_json(&json).map_err(|e| TrackerError::Config(e.to_string()))?;
        Self::from_poller_config(config)
    }

    pub fn set_app_state(&self, state: AppStateKind) {
        debug!("host app state: {state:?}");
        self.poller.set_app_state(state.into());
    }

    pub fn set_user_location(&self, latitude: f64, longitude: f64) {
        self.update_coordinate(Some(Coordinate::new(latitude, longitude)));
    }

    pub fn clear_user_location(&self) {
        self.update_coordinate(None);
    }

    /// Ask for location permission if needed and start tracking the user's
    /// position through the platform.
    pub fn attach_location(&self, platform: Arc<dyn PlatformLocation>) {
        let provider = CoordinateProvider::new(ForeignLocation(platform));
        let provider: SharedProvider = Arc::new(tokio::sync::Mutex::new(provider));
        if let Ok(mut slot) = self.provider.lock() {
            *slot = Some(Arc::clone(&provider));
        }

        let poller = Arc::clone(&self.poller);
        let user = Arc::clone(&self.user);
        self.runtime.spawn(async move {
            let mut provider = provider.lock().await;
            let coordinate = provider.resolve().await;
            store_user_location(&user, &poller, provider.status(), coordinate);
        });
    }

    pub fn set_listener(&self, listener: Arc<dyn TrainSnapshotListener>) {
        let mut updates = self.poller.subscribe();
        let task = self.runtime.spawn(async move {
            while updates.changed().await.is_ok() {
                let markers = markers_for(&updates.borrow_and_update());
                listener.on_trains_updated(markers);
            }
        });

        if let Ok(mut slot) = self.listener_task.lock() {
            if let Some(previous) = slot.replace(task) {
                previous.abort();
            }
        }
    }

    pub fn markers(&self) -> Vec<TrainMarker> {
        markers_for(&self.poller.snapshot())
    }

    pub fn map_buttons(&self) -> MapButtons {
        let granted = self.user_location().0 == PermissionStatus::Granted;
        MapButtons::new(self.poller.snapshot().len(), granted)
    }

    /// Locate-me button: frames the nearest trains, or the user when there
    /// are none, and refreshes the user's position in the background.
    pub fn recenter(&self) -> Option<CameraCommand> {
        self.refresh_location();
        recenter_command(self.user_location().1, &self.poller.snapshot())
    }

    pub fn fit_all_trains(&self) -> Option<CameraCommand> {
        fit_all_command(&self.poller.snapshot())
    }

    pub fn select_marker(&self, identifier: String) -> Result<CameraCommand, TrackerError> {
        let snapshot = self.poller.snapshot();
        let train = snapshot
            .find(&TrainIdentifier::new(&identifier))
            .map_err(|e| {
                debug!("{e}");
                TrackerError::UnknownTrain(identifier)
            })?;
        Ok(select_marker_command(train))
    }

    pub fn stats(&self) -> TrackerStats {
        self.poller.stats().into()
    }
}

impl TrainTracker {
    fn from_poller_config(config: PollerConfig) -> Result<Arc<Self>, TrackerError> {
        let feed =
            AmtrakerFeed::from_config(&config).map_err(|e| TrackerError::Config(e.to_string()))?;
        Self::with_feed(config, Arc::new(feed))
    }

    pub(crate) fn with_feed(
        config: PollerConfig,
        feed: Arc<dyn TrainFeed>,
    ) -> Result<Arc<Self>, TrackerError> {
        let runtime = Runtime::new().map_err(|e| TrackerError::Runtime(e.to_string()))?;
        let poller = PollerDriver::spawn_on(runtime.handle(), feed, &config)
            .map_err(|e| TrackerError::Config(e.to_string()))?;
        info!("train tracker started; polling every {:?}", config.interval());

        Ok(Arc::new(Self {
            poller: Arc::new(poller),
            user: Arc::new(Mutex::new(UserLocation::default())),
            provider: Mutex::new(None),
            listener_task: Mutex::new(None),
            runtime,
        }))
    }

    fn update_coordinate(&self, coordinate: Option<Coordinate>) {
        if let Ok(mut user) = self.user.lock() {
            user.coordinate = coordinate;
        }
        self.poller.set_coordinate(coordinate);
    }

    fn user_location(&self) -> (PermissionStatus, Option<Coordinate>) {
        self.user
            .lock()
            .map(|user| (user.permission, user.coordinate))
            .unwrap_or_default()
    }

    fn refresh_location(&self) {
        let Some(provider) = self.provider.lock().ok().and_then(|slot| slot.clone()) else {
            return;
        };

        let poller = Arc::clone(&self.poller);
        let user = Arc::clone(&self.user);
        self.runtime.spawn(async move {
            let mut provider = provider.lock().await;
            let coordinate = provider.refresh().await;
            store_user_location(&user, &poller, provider.status(), coordinate);
        });
    }
}

fn store_user_location(
    user: &Mutex<UserLocation>,
    poller: &PollerHandle,
    permission: PermissionStatus,
    coordinate: Option<Coordinate>,
) {
    if let Ok(mut user) = user.lock() {
        user.permission = permission;
        user.coordinate = coordinate;
    }
    poller.set_coordinate(coordinate);
}
