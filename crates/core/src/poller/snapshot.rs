use std::sync::Arc;

use chrono::{DateTime, Utc};
use nearby_trains_transit::{
    Coordinate, DistanceUnit, Result, Train, TrainIdentifier, TransitError, sort_by_distance,
};
use tracing::warn;

/// Every tracked train from one poll, nearest first when the user's
/// position is known.
#[derive(Clone, Debug, Default)]
pub struct TrainSnapshot {
    pub trains: Arc<[Train]>,
    /// False when no coordinate was known and feed order was kept
    pub sorted: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Bumped on every published change
    pub generation: u64,
}

impl TrainSnapshot {
    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    pub fn nearest(&self, count: usize) -> &[Train] {
        &self.trains[..count.min(self.trains.len())]
    }

    pub fn find(&self, id: &TrainIdentifier) -> Result<&Train> {
        self.trains
            .iter()
            .find(|train| train.train_id == *id)
            .ok_or_else(|| TransitError::TrainNotFound(id.clone()))
    }
}

/// Snapshots compare by content; bookkeeping fields are ignored.
impl PartialEq for TrainSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.trains == other.trains
    }
}

/// Order a flattened feed for display.
///
/// Without a coordinate the feed order is returned untouched.
pub fn arrange(
    mut trains: Vec<Train>,
    origin: Option<Coordinate>,
    unit: DistanceUnit,
) -> Vec<Train> {
    match origin {
        Some(origin) => sort_by_distance(&mut trains, origin, unit),
        None => warn!("no user coordinate yet; keeping feed order"),
    }
    trains
}
