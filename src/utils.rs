use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use std::fs;
use std::io::{self, BufReader};
use std::path::Path;

use crate::types::TrackingResults;

/// JPEG quality used for extracted frames
pub const JPEG_QUALITY: u8 = 95;

/// Read and parse a tracking results JSON file.
///
/// The file is parsed straight from a buffered stream since mask exports for
/// long videos get large.
pub fn read_tracking_results(path: &Path) -> Option<TrackingResults> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!(
                "Failed to open tracking results ({}): {:?}",
                path.display(),
                e
            );
            return None;
        }
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(results) => Some(results),
        Err(e) => {
            error!(
                "Failed to parse tracking results ({}): {:?}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Encode a single frame as a JPEG still
pub fn encode_jpeg(frame: &RgbImage) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(frame)
        .map_err(io::Error::other)?;
    Ok(buffer)
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
