//! Tracking masks to YOLO dataset exporter
//!
//! This library converts per-frame object masks from a video tracker into YOLO
//! bounding-box labels and packages them, with an optional copy of the tracked
//! video frames, into a ZIP archive built in memory.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod io;
pub mod rle;
pub mod types;
pub mod utils;
pub mod video;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use config::Args;
pub use conversion::{create_yolo_annotation, mask_to_bbox};
pub use dataset::ClassMap;
pub use types::{BoundingBox, Counts, MaskRecord, RleMask, TrackingResults};
pub use video::{FfmpegOpener, VideoOpener, VideoSource};
pub use yolo_dataset::YoloExporter;
