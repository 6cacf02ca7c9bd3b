use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::ClassMap;

// Run lengths of a COCO mask, either as a plain list or the compressed string form
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Counts {
    Uncompressed(Vec<u32>),
    Compressed(String),
}

// A run-length encoded binary mask together with the frame size it was computed against
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RleMask {
    /// `[height, width]` of the source frame
    pub size: [u32; 2],
    pub counts: Counts,
}

impl RleMask {
    pub fn height(&self) -> u32 {
        self.size[0]
    }

    pub fn width(&self) -> u32 {
        self.size[1]
    }
}

// One tracked object in one frame
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MaskRecord {
    pub object_id: i64,
    pub mask: RleMask,
}

/// Frame index to the ordered mask records of that frame
pub type TrackingResults = BTreeMap<u32, Vec<MaskRecord>>;

/// A YOLO bounding box, normalized to the frame width and height
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Boxes with zero width or height carry no annotation
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

// The metadata.json document written next to the labels
#[derive(Debug, Serialize)]
pub struct ExportMetadata<'a> {
    pub session_id: &'a str,
    pub video_path: &'a str,
    pub num_frames: usize,
    pub num_objects: usize,
    pub object_mapping: &'a ClassMap,
    pub frames: Vec<u32>,
}
