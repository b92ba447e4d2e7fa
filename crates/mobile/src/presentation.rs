//! What the map screen shows, computed from the latest snapshot.
//!
//! The host app does the drawing; it only needs marker text, which buttons
//! to show, and where to point the camera.

use nearby_trains_core::TrainSnapshot;
use nearby_trains_core::transit::{Coordinate, Train};

/// Altitude for showing the user with their surroundings when no trains are known
pub const USER_ALTITUDE: f64 = 10_000.0;
/// Altitude for zooming in on a selected train
pub const TRAIN_ALTITUDE: f64 = 2_000.0;
pub const FIT_NEAREST_COUNT: usize = 5;
pub const FIT_EDGE_PADDING: f64 = 100.0;

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct TrainMarker {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: String,
}

impl From<&Train> for TrainMarker {
    fn from(train: &Train) -> Self {
        Self {
            identifier: train.train_id.to_string(),
            latitude: train.lat,
            longitude: train.lon,
            title: format!("Train {}", train.train_num),
            description: format!("Heading {} to {}", train.heading, train.dest_name),
        }
    }
}

pub fn markers_for(snapshot: &TrainSnapshot) -> Vec<TrainMarker> {
    snapshot.trains.iter().map(TrainMarker::from).collect()
}

/// Overlay buttons: the train counter and the locate-me arrow
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Record)]
pub struct MapButtons {
    pub trains_total: u32,
    pub show_train_button: bool,
    pub show_user_location_button: bool,
    pub show_divider: bool,
    /// False when neither button is shown and the overlay can be hidden
    pub visible: bool,
}

impl MapButtons {
    pub fn new(trains_total: usize, show_user_location_button: bool) -> Self {
        let trains_total = u32::try_from(trains_total).unwrap_or(u32::MAX);
        let show_train_button = trains_total > 0;

        Self {
            trains_total,
            show_train_button,
            show_user_location_button,
            show_divider: show_train_button && show_user_location_button,
            visible: show_train_button || show_user_location_button,
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum CameraCommand {
    CenterOn {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },
    FitMarkers {
        identifiers: Vec<String>,
        edge_padding: f64,
    },
    FitAll,
}

/// Camera move for the locate-me button.
///
/// With trains on the map the camera frames the nearest few; otherwise it
/// centers on the user.
pub fn recenter_command(
    coordinate: Option<Coordinate>,
    snapshot: &TrainSnapshot,
) -> Option<CameraCommand> {
    if !snapshot.is_empty() {
        return Some(CameraCommand::FitMarkers {
            identifiers: snapshot
                .nearest(FIT_NEAREST_COUNT)
                .iter()
                .map(|train| train.train_id.to_string())
                .collect(),
            edge_padding: FIT_EDGE_PADDING,
        });
    }

    coordinate.map(|coordinate| CameraCommand::CenterOn {
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
        altitude: USER_ALTITUDE,
    })
}

pub fn fit_all_command(snapshot: &TrainSnapshot) -> Option<CameraCommand> {
    (!snapshot.is_empty()).then_some(CameraCommand::FitAll)
}

pub fn select_marker_command(train: &Train) -> CameraCommand {
    CameraCommand::CenterOn {
        latitude: train.lat,
        longitude: train.lon,
        altitude: TRAIN_ALTITUDE,
    }
}
