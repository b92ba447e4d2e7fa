//! Core data types and enums for live train data.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identifiers::*;

// ============================================================================
// Coordinates
// ============================================================================

/// A geographic position in degrees.
///
/// Ranges are not enforced; use [`Coordinate::is_valid`] where it matters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// `geo` works in (x, y) = (longitude, latitude)
    pub fn to_point(self) -> geo::Point {
        geo::Point::new(self.longitude, self.latitude)
    }
}

impl From<geo::Point> for Coordinate {
    fn from(point: geo::Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Direction of travel in degrees clockwise from north.
///
/// The feed reports compass points ("N", "SW", ...) while some sources send
/// plain numbers, so both decode into degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Heading(Option<f64>);

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

impl Heading {
    pub const UNKNOWN: Heading = Heading(None);

    pub fn from_degrees(degrees: f64) -> Self {
        if degrees.is_finite() {
            Self(Some(degrees.rem_euclid(360.0)))
        } else {
            Self::UNKNOWN
        }
    }

    pub fn from_compass(label: &str) -> Self {
        let label = label.trim();
        COMPASS_POINTS
            .iter()
            .position(|point| point.eq_ignore_ascii_case(label))
            .map(|index| Self(Some(index as f64 * 45.0)))
            .unwrap_or(Self::UNKNOWN)
    }

    pub fn degrees(&self) -> Option<f64> {
        self.0
    }

    /// Nearest of the eight compass points
    pub fn compass(&self) -> Option<&'static str> {
        self.0.map(|degrees| {
            let index = ((degrees / 45.0).round() as usize) % COMPASS_POINTS.len();
            COMPASS_POINTS[index]
        })
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.compass() {
            Some(point) => f.write_str(point),
            None => f.write_str("unknown"),
        }
    }
}

impl Serialize for Heading {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(degrees) => serializer.serialize_f64(degrees),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Heading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawHeading {
            Degrees(f64),
            Label(String),
            Missing(()),
        }

        Ok(match RawHeading::deserialize(deserializer)? {
            RawHeading::Degrees(degrees) => Heading::from_degrees(degrees),
            RawHeading::Label(label) => Heading::from_compass(&label),
            RawHeading::Missing(()) => Heading::UNKNOWN,
        })
    }
}

/// Where a train is in its run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainState {
    Predeparture,
    Active,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A single tracked train as reported by the feed.
///
/// Read-only input data: nothing downstream mutates a `Train`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    #[serde(rename = "trainID")]
    pub train_id: TrainIdentifier,
    #[serde(default)]
    pub train_num: String,
    #[serde(default)]
    pub route_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub heading: Heading,
    #[serde(default)]
    pub velocity: f64,
    #[serde(default)]
    pub dest_name: String,
    #[serde(default)]
    pub dest_code: StationCode,
    #[serde(default)]
    pub orig_name: String,
    #[serde(default)]
    pub orig_code: StationCode,
    #[serde(default)]
    pub train_state: TrainState,
    #[serde(default)]
    pub status_msg: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Train {
    /// Minimal train for a position; the remaining fields take their defaults.
    pub fn new(train_id: impl Into<TrainIdentifier>, lat: f64, lon: f64) -> Self {
        Self {
            train_id: train_id.into(),
            train_num: String::new(),
            route_name: String::new(),
            lat,
            lon,
            heading: Heading::UNKNOWN,
            velocity: 0.0,
            dest_name: String::new(),
            dest_code: StationCode::default(),
            orig_name: String::new(),
            orig_code: StationCode::default(),
            train_state: TrainState::Unknown,
            status_msg: String::new(),
            provider: String::new(),
            updated_at: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitError {
    #[error("Train not found: {0}")]
    TrainNotFound(TrainIdentifier),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for TransitError {
    fn from(error: serde_json::Error) -> Self {
        TransitError::Decode(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(40.75, -73.99).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn test_coordinate_point_axes() {
        let point = Coordinate::new(40.0, -74.0).to_point();
        assert_eq!(point.x(), -74.0);
        assert_eq!(point.y(), 40.0);
        assert_eq!(Coordinate::from(point), Coordinate::new(40.0, -74.0));
    }

    #[test]
    fn test_heading_compass_round_trip() {
        assert_eq!(Heading::from_compass("SW").degrees(), Some(225.0));
        assert_eq!(Heading::from_compass("ne").compass(), Some("NE"));
        assert_eq!(Heading::from_compass("sideways"), Heading::UNKNOWN);

        // 350 degrees is closer to north than to north-west
        assert_eq!(Heading::from_degrees(350.0).compass(), Some("N"));
        assert_eq!(Heading::from_degrees(-90.0).degrees(), Some(270.0));
        assert_eq!(Heading::from_degrees(f64::NAN), Heading::UNKNOWN);
    }

    #[test]
    fn test_heading_decoding() {
        let label: Heading = serde_json::from_str("\"E\"").unwrap();
        let number: Heading = serde_json::from_str("135").unwrap();
        let null: Heading = serde_json::from_str("null").unwrap();

        assert_eq!(label.degrees(), Some(90.0));
        assert_eq!(number.to_string(), "SE");
        assert_eq!(null.to_string(), "unknown");
    }

    #[test]
    fn test_train_decoding() {
        let json = r#"{
            "routeName": "Northeast Regional",
            "trainNum": "171",
            "trainID": "171-16",
            "lat": 40.7506,
            "lon": -73.9935,
            "heading": "SW",
            "velocity": 12.5,
            "destName": "Washington",
            "destCode": "WAS",
            "origName": "Boston",
            "origCode": "BOS",
            "trainState": "Active",
            "statusMsg": "On Time",
            "provider": "Amtrak",
            "updatedAt": "2024-05-16T10:00:00-04:00",
            "stations": []
        }"#;

        let train: Train = serde_json::from_str(json).unwrap();
        assert_eq!(train.train_id, TrainIdentifier::new("171-16"));
        assert_eq!(train.train_num, "171");
        assert_eq!(train.heading.compass(), Some("SW"));
        assert_eq!(train.dest_code, StationCode::new("WAS"));
        assert_eq!(train.train_state, TrainState::Active);
        assert_eq!(train.coordinate(), Coordinate::new(40.7506, -73.9935));
    }

    #[test]
    fn test_train_decoding_defaults() {
        let json = r#"{ "trainID": "7-1", "lat": 47.6, "lon": -122.3, "trainState": "Delayed" }"#;

        let train: Train = serde_json::from_str(json).unwrap();
        assert_eq!(train.heading, Heading::UNKNOWN);
        assert_eq!(train.train_state, TrainState::Unknown);
        assert!(train.dest_name.is_empty());
        assert!(train.updated_at.is_none());
    }

    #[test]
    fn test_train_requires_position() {
        let json = r#"{ "trainID": "7-1", "lat": 47.6 }"#;
        assert!(serde_json::from_str::<Train>(json).is_err());
    }
}
