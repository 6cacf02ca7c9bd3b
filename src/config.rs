use clap::Parser;
use std::path::PathBuf;

use crate::video::FfmpegOpener;

/// Command-line arguments for exporting tracked masks as a YOLO dataset.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// JSON file mapping frame index to the tracked object masks of that frame
    #[arg(short = 't', long = "tracking_file")]
    pub tracking_file: PathBuf,

    /// Session identifier used to name the archive contents
    #[arg(short = 's', long = "session_id", value_parser = validate_session_id)]
    pub session_id: String,

    /// Source video the masks were computed on
    #[arg(long = "video_path")]
    pub video_path: Option<PathBuf>,

    /// Flag to copy the tracked frames of the video into the archive as JPEG images
    #[arg(long = "extract_frames")]
    pub extract_frames: bool,

    /// Output archive path, defaults to session_<session_id>.zip
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// ffmpeg binary used to decode the video
    #[arg(long = "ffmpeg", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe binary used to read the video dimensions
    #[arg(long = "ffprobe", default_value = "ffprobe")]
    pub ffprobe: PathBuf,

    /// Flag to hide progress bars
    #[arg(long = "no_progress")]
    pub no_progress: bool,
}

impl Args {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("session_{}.zip", self.session_id)))
    }

    pub fn video_path(&self) -> PathBuf {
        self.video_path.clone().unwrap_or_default()
    }

    pub fn video_opener(&self) -> FfmpegOpener {
        FfmpegOpener {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }
}

// Session ids name the top-level archive directory, so they must be a single path component
pub fn validate_session_id(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Err("SESSION_ID must not be empty".to_string())
    } else if s.contains(['/', '\\']) || s == "." || s == ".." {
        Err("SESSION_ID must not contain path separators".to_string())
    } else {
        Ok(s.to_string())
    }
}
