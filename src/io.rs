use std::io::{self, Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::dataset::ClassMap;
use crate::types::{ExportMetadata, TrackingResults};

/// Path of classes.txt inside the archive
pub fn classes_path(session_id: &str) -> String {
    format!("session_{}/classes.txt", session_id)
}

/// Path of a frame's label file inside the archive
pub fn label_path(session_id: &str, frame_index: u32) -> String {
    format!("session_{}/labels/frame_{:04}.txt", session_id, frame_index)
}

/// Path of metadata.json inside the archive
pub fn metadata_path(session_id: &str) -> String {
    format!("session_{}/metadata.json", session_id)
}

/// Path of an extracted frame image inside the archive
pub fn image_path(session_id: &str, frame_index: u32) -> String {
    format!("session_{}/images/frame_{:04}.jpg", session_id, frame_index)
}

/// Deflate-compressed ZIP archive assembled in memory
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        // Fixed entry timestamps keep repeated exports byte-identical
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }

    /// Add one file to the archive
    pub fn add_file(&mut self, path: &str, contents: &[u8]) -> io::Result<()> {
        self.zip
            .start_file(path, self.options)
            .map_err(io::Error::other)?;
        self.zip.write_all(contents)
    }

    /// Finish the central directory and return the archive bytes
    pub fn finish(self) -> io::Result<Vec<u8>> {
        let cursor = self.zip.finish().map_err(io::Error::other)?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write classes.txt for the export
pub fn write_classes(
    writer: &mut ArchiveWriter,
    session_id: &str,
    class_map: &ClassMap,
) -> io::Result<()> {
    writer.add_file(&classes_path(session_id), class_map.classes_txt().as_bytes())
}

/// Write metadata.json summarizing the export
pub fn write_metadata(
    writer: &mut ArchiveWriter,
    session_id: &str,
    video_path: &str,
    tracking_results: &TrackingResults,
    class_map: &ClassMap,
) -> io::Result<()> {
    let metadata = ExportMetadata {
        session_id,
        video_path,
        num_frames: tracking_results.len(),
        num_objects: class_map.len(),
        object_mapping: class_map,
        frames: tracking_results.keys().copied().collect(),
    };

    let content = serde_json::to_string_pretty(&metadata)?;
    writer.add_file(&metadata_path(session_id), content.as_bytes())
}
