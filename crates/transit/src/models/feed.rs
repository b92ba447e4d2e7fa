//! Grouped feed payloads.
//!
//! The feed answers with an object keyed by train number, each value holding
//! every run of that number currently tracked:
//!
//! ```json
//! { "171": [ { "trainID": "171-16", ... } ], "2150": [ ... ] }
//! ```
//!
//! Groups are kept in document order so that flattening reproduces the
//! feed's own ordering.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::models::types::Train;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainGroup {
    pub key: String,
    pub trains: Vec<Train>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainFeedResponse {
    groups: Vec<TrainGroup>,
}

impl TrainFeedResponse {
    pub fn new(groups: Vec<TrainGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[TrainGroup] {
        &self.groups
    }

    pub fn train_count(&self) -> usize {
        self.groups.iter().map(|group| group.trains.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.train_count() == 0
    }

    /// All trains, group by group, in feed order
    pub fn flatten(self) -> Vec<Train> {
        self.groups
            .into_iter()
            .flat_map(|group| group.trains)
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Train>)> for TrainFeedResponse {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Train>)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(key, trains)| TrainGroup {
                    key: key.into(),
                    trains,
                })
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for TrainFeedResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = TrainFeedResponse;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping train numbers to lists of trains")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, trains)) = map.next_entry::<String, Vec<Train>>()? {
                    groups.push(TrainGroup { key, trains });
                }
                Ok(TrainFeedResponse { groups })
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}
