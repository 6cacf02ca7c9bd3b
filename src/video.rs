//! Sequential video decoding and frame extraction
//!
//! Frames are pulled strictly in decode order from the first frame and counted
//! with a zero-based counter that ignores any embedded timestamps.

use image::RgbImage;
use indicatif::ProgressBar;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use crate::io::{image_path, ArchiveWriter};
use crate::utils::encode_jpeg;

/// A decoded video stream. Dropping the source releases the decoder.
pub trait VideoSource {
    /// Next frame in decode order, or `None` at end of stream
    fn next_frame(&mut self) -> io::Result<Option<RgbImage>>;
}

/// Opens video files for decoding
pub trait VideoOpener {
    type Source: VideoSource;

    fn open(&self, path: &Path) -> io::Result<Self::Source>;
}

/// Decodes videos by piping raw RGB frames out of the `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfmpegOpener {
    /// Width and height of the first video stream
    fn video_dimensions(&self, path: &Path) -> io::Result<(u32, u32)> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-print_format",
                "json",
                "-show_streams",
            ])
            .arg(path)
            .output()?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "ffprobe failed (exit code {:?}): {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let output: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
        output
            .streams
            .iter()
            .filter(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
            .find_map(|s| match (s.width, s.height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
                _ => None,
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("no video stream in {}", path.display()),
                )
            })
    }
}

impl VideoOpener for FfmpegOpener {
    type Source = FfmpegVideo;

    fn open(&self, path: &Path) -> io::Result<FfmpegVideo> {
        let (width, height) = self.video_dimensions(path)?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-noautorotate", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-fps_mode",
                "passthrough",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::other("ffmpeg output was not captured"));
            }
        };

        // Drained on its own thread while frames are read from stdout
        let stderr = thread::spawn(move || {
            let mut stderr = stderr;
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        });

        debug!(
            "Opened {} ({}x{}) for frame extraction",
            path.display(),
            width,
            height
        );

        Ok(FfmpegVideo {
            child,
            stdout,
            stderr: Some(stderr),
            width,
            height,
        })
    }
}

/// A running ffmpeg decode of one video
pub struct FfmpegVideo {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
}

impl FfmpegVideo {
    /// Reap ffmpeg once its output is exhausted and report how the decode ended
    fn end_of_stream(&mut self, filled: usize, frame_len: usize) -> io::Result<Option<RgbImage>> {
        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(io::Error::other(format!(
                "ffmpeg execution failed (exit code {:?}): {}",
                status.code(),
                stderr.trim()
            )));
        }

        if filled > 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "video stream ended mid-frame ({} of {} bytes)",
                    filled, frame_len
                ),
            ));
        }

        Ok(None)
    }
}

impl VideoSource for FfmpegVideo {
    fn next_frame(&mut self) -> io::Result<Option<RgbImage>> {
        let frame_len = self.width as usize * self.height as usize * 3;
        let mut buffer = vec![0u8; frame_len];

        let mut filled = 0;
        while filled < frame_len {
            match self.stdout.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled < frame_len {
            return self.end_of_stream(filled, frame_len);
        }

        Ok(RgbImage::from_raw(self.width, self.height, buffer))
    }
}

impl Drop for FfmpegVideo {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Copy the requested frames of a video into the archive as JPEG images.
///
/// Returns the number of images written. Frame indices that the video never
/// reaches produce no entry. A decode error ends extraction early but keeps
/// the frames already written.
pub fn extract_frames<S: VideoSource>(
    writer: &mut ArchiveWriter,
    mut source: S,
    frame_indices: &BTreeSet<u32>,
    session_id: &str,
    pb: &ProgressBar,
) -> io::Result<usize> {
    let mut frame_idx: u64 = 0;
    let mut written = 0;

    loop {
        // Nothing left to find further into the stream
        if written == frame_indices.len() {
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to decode frame {}: {}", frame_idx, e);
                break;
            }
        };

        if let Ok(index) = u32::try_from(frame_idx) {
            if frame_indices.contains(&index) {
                let jpeg = encode_jpeg(&frame)?;
                writer.add_file(&image_path(session_id, index), &jpeg)?;
                written += 1;
                pb.inc(1);
            }
        }

        frame_idx += 1;
    }

    drop(source);
    debug!("Scanned {} frames, extracted {}", frame_idx, written);
    Ok(written)
}
