//! User location behind a permission gate.
//!
//! The platform owns the permission prompt and the location hardware; this
//! module only tracks what they reported.

use std::future::Future;
use std::pin::Pin;

use nearby_trains_transit::Coordinate;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Platform location service
pub trait LocationService: Send + Sync {
    fn permission_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + 'a>>;

    /// Prompt the user if the platform still can
    fn request_permission<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + 'a>>;

    /// Suspends until the platform resolves a position or gives up
    fn current_coordinate<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + 'a>>;
}

pub struct CoordinateProvider<L> {
    service: L,
    status: PermissionStatus,
    coordinate: Option<Coordinate>,
}

impl<L: LocationService> CoordinateProvider<L> {
    pub fn new(service: L) -> Self {
        Self {
            service,
            status: PermissionStatus::Undetermined,
            coordinate: None,
        }
    }

    pub fn status(&self) -> PermissionStatus {
        self.status
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    /// Ask for permission if it was never decided, then read one position.
    ///
    /// A denied permission is not an error: the coordinate just stays absent.
    pub async fn resolve(&mut self) -> Option<Coordinate> {
        self.status = self.service.permission_status().await;

        if self.status == PermissionStatus::Undetermined {
            self.status = self.service.request_permission().await;
            info!("location permission: {:?}", self.status);
        }

        if self.status != PermissionStatus::Granted {
            debug!("location permission is {:?}; coordinate stays unresolved", self.status);
            return self.coordinate;
        }

        self.refresh().await
    }

    /// Re-read the position without prompting.
    ///
    /// A failed read keeps whatever coordinate was known before.
    pub async fn refresh(&mut self) -> Option<Coordinate> {
        if self.status != PermissionStatus::Granted {
            return self.coordinate;
        }

        match self.service.current_coordinate().await {
            Ok(coordinate) => {
                debug!("user located at {coordinate}");
                self.coordinate = Some(coordinate);
            }
            Err(error) => warn!("failed to resolve user location: {error}"),
        }

        self.coordinate
    }
}
