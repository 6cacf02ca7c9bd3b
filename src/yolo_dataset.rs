use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use crate::conversion::create_yolo_annotation;
use crate::dataset::ClassMap;
use crate::io::{label_path, write_classes, write_metadata, ArchiveWriter};
use crate::types::TrackingResults;
use crate::utils::create_progress_bar;
use crate::video::{extract_frames, FfmpegOpener, VideoOpener};

/// Exports tracking results as a zipped YOLO dataset.
///
/// The exporter only carries configuration; every call to
/// [`YoloExporter::create_zip_in_memory`] derives its own class mapping.
#[derive(Debug, Clone, Default)]
pub struct YoloExporter<O: VideoOpener = FfmpegOpener> {
    opener: O,
    show_progress: bool,
}

impl YoloExporter<FfmpegOpener> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: VideoOpener> YoloExporter<O> {
    /// Use a different video decoder for frame extraction
    pub fn with_opener(opener: O) -> Self {
        Self {
            opener,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, len: u64, label: &str) -> ProgressBar {
        if self.show_progress {
            create_progress_bar(len, label)
        } else {
            ProgressBar::hidden()
        }
    }

    /// Build the complete archive for one tracking session.
    ///
    /// Layout under `session_{session_id}/`: `classes.txt`, one
    /// `labels/frame_NNNN.txt` per frame, `metadata.json`, and when
    /// `extract_frames` is set and the video exists, `images/frame_NNNN.jpg`
    /// for every tracked frame found in the video.
    pub fn create_zip_in_memory(
        &self,
        session_id: &str,
        video_path: &Path,
        tracking_results: &TrackingResults,
        extract_frames: bool,
    ) -> io::Result<Vec<u8>> {
        let class_map = ClassMap::from_tracking_results(tracking_results);
        info!(
            "Exporting session {}: {} frames, {} objects",
            session_id,
            tracking_results.len(),
            class_map.len()
        );

        let mut writer = ArchiveWriter::new();

        write_classes(&mut writer, session_id, &class_map)?;

        let pb = self.progress_bar(tracking_results.len() as u64, "Labels");
        for (&frame_index, object_results) in tracking_results {
            let annotation = create_yolo_annotation(frame_index, object_results, &class_map)?;
            writer.add_file(&label_path(session_id, frame_index), annotation.as_bytes())?;
            pb.inc(1);
        }
        pb.finish_with_message("Labels complete");

        write_metadata(
            &mut writer,
            session_id,
            &video_path.to_string_lossy(),
            tracking_results,
            &class_map,
        )?;

        if extract_frames {
            self.add_frames(&mut writer, video_path, tracking_results, session_id)?;
        }

        writer.finish()
    }

    fn add_frames(
        &self,
        writer: &mut ArchiveWriter,
        video_path: &Path,
        tracking_results: &TrackingResults,
        session_id: &str,
    ) -> io::Result<()> {
        if !video_path.exists() {
            warn!(
                "Video not found, skipping frame extraction: {}",
                video_path.display()
            );
            return Ok(());
        }

        let source = match self.opener.open(video_path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not open video {}: {}", video_path.display(), e);
                return Ok(());
            }
        };

        let frame_indices: BTreeSet<u32> = tracking_results.keys().copied().collect();
        let pb = self.progress_bar(frame_indices.len() as u64, "Frames");
        let written = extract_frames(writer, source, &frame_indices, session_id, &pb)?;
        pb.finish_with_message("Frames complete");

        debug!(
            "Extracted {} of {} tracked frames from {}",
            written,
            frame_indices.len(),
            video_path.display()
        );
        Ok(())
    }
}
