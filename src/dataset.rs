use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::TrackingResults;

/// Class index used when an object id is missing from the map
pub const DEFAULT_CLASS_INDEX: usize = 0;

/// Per-export mapping from tracker object ids to dense YOLO class indices.
///
/// Ids are assigned `0..N-1` in ascending id order, so the same tracking
/// results always produce the same mapping regardless of frame or record order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassMap {
    classes: BTreeMap<i64, usize>,
}

impl ClassMap {
    /// Collect every distinct object id across all frames and number them
    pub fn from_tracking_results(tracking_results: &TrackingResults) -> Self {
        Self::from_object_ids(
            tracking_results
                .values()
                .flat_map(|records| records.iter().map(|record| record.object_id)),
        )
    }

    pub fn from_object_ids<I: IntoIterator<Item = i64>>(object_ids: I) -> Self {
        let sorted: BTreeSet<i64> = object_ids.into_iter().collect();
        let classes = sorted
            .into_iter()
            .enumerate()
            .map(|(class_index, object_id)| (object_id, class_index))
            .collect();
        Self { classes }
    }

    pub fn class_index(&self, object_id: i64) -> Option<usize> {
        self.classes.get(&object_id).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `(object_id, class_index)` in class order
    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.classes.iter().map(|(&id, &class_index)| (id, class_index))
    }

    /// Contents of classes.txt: one label per class, newline-joined
    pub fn classes_txt(&self) -> String {
        self.classes
            .keys()
            .map(|&id| class_label(id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Human readable label of a tracked object
pub fn class_label(object_id: i64) -> String {
    format!("object_{}", object_id)
}

// Serialized as {"object_<id>": class_index, ...} in class order
impl Serialize for ClassMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.classes.len()))?;
        for (id, class_index) in self.iter() {
            map.serialize_entry(&class_label(id), &class_index)?;
        }
        map.end()
    }
}
