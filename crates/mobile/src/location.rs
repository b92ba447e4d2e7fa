//! Bridges the platform's location APIs into the core's [`LocationService`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use nearby_trains_core::transit::Coordinate;
use nearby_trains_core::{LocationError, LocationService, PermissionStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum LocationPermission {
    Undetermined,
    Granted,
    Denied,
}

impl From<LocationPermission> for PermissionStatus {
    fn from(permission: LocationPermission) -> Self {
        match permission {
            LocationPermission::Undetermined => PermissionStatus::Undetermined,
            LocationPermission::Granted => PermissionStatus::Granted,
            LocationPermission::Denied => PermissionStatus::Denied,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, uniffi::Record)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for Coordinate {
    fn from(point: GeoPoint) -> Self {
        Coordinate::new(point.latitude, point.longitude)
    }
}

/// Implemented in Kotlin/Swift on top of the platform location manager.
///
/// Calls may block; they are made from a blocking-pool thread.
#[uniffi::export(with_foreign)]
pub trait PlatformLocation: Send + Sync {
    fn permission_status(&self) -> LocationPermission;
    fn request_permission(&self) -> LocationPermission;
    /// `None` when no fix could be obtained
    fn current_location(&self) -> Option<GeoPoint>;
}

pub(crate) struct ForeignLocation(pub(crate) Arc<dyn PlatformLocation>);

impl ForeignLocation {
    async fn call<T, F>(&self, f: F) -> Result<T, LocationError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PlatformLocation) -> T + Send + 'static,
    {
        let platform = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || f(platform.as_ref()))
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))
    }
}

impl LocationService for ForeignLocation {
    fn permission_status<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + 'a>> {
        Box::pin(async move {
            self.call(|platform| platform.permission_status())
                .await
                .map(PermissionStatus::from)
                .unwrap_or_default()
        })
    }

    fn request_permission<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + 'a>> {
        Box::pin(async move {
            self.call(|platform| platform.request_permission())
                .await
                .map(PermissionStatus::from)
                .unwrap_or_default()
        })
    }

    fn current_coordinate<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + 'a>> {
        Box::pin(async move {
            self.call(|platform| platform.current_location())
                .await?
                .map(Coordinate::from)
                .ok_or_else(|| LocationError::Unavailable("platform returned no fix".into()))
        })
    }
}
