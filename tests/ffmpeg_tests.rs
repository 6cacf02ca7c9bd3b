//! Tests for the ffmpeg-backed decoder, run against shell-script stand-ins
//! for the `ffmpeg` and `ffprobe` binaries.
#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use mask2yolo::{Counts, FfmpegOpener, MaskRecord, RleMask, VideoOpener, VideoSource, YoloExporter};

// Writing an executable while another test thread forks can leave the file
// busy at exec time, so these tests run one at a time.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

const FFPROBE_2X1: &str = r#"echo '{"streams":[{"codec_type":"video","width":2,"height":1}]}'"#;

// Two 2x1 rgb24 frames
const TWO_FRAMES: &str = r"printf '\001\002\003\004\005\006\011\012\013\014\015\016'";

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn fake_opener(dir: &Path, ffprobe_body: &str, ffmpeg_body: &str) -> FfmpegOpener {
    FfmpegOpener {
        ffmpeg: write_script(dir, "ffmpeg", ffmpeg_body),
        ffprobe: write_script(dir, "ffprobe", ffprobe_body),
    }
}

fn video_file(dir: &Path) -> PathBuf {
    let path = dir.join("clip.mp4");
    fs::write(&path, b"video").unwrap();
    path
}

fn single_pixel_record() -> Vec<MaskRecord> {
    vec![MaskRecord {
        object_id: 1,
        mask: RleMask {
            size: [1, 2],
            counts: Counts::Uncompressed(vec![0, 1, 1]),
        },
    }]
}

#[test]
fn test_ffmpeg_frames_in_order() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(temp_dir.path(), FFPROBE_2X1, TWO_FRAMES);

    let mut video = opener.open(&video_file(temp_dir.path())).unwrap();

    let first = video.next_frame().unwrap().unwrap();
    assert_eq!((first.width(), first.height()), (2, 1));
    assert_eq!(first.as_raw(), &vec![1, 2, 3, 4, 5, 6]);

    let second = video.next_frame().unwrap().unwrap();
    assert_eq!(second.as_raw(), &vec![9, 10, 11, 12, 13, 14]);

    assert!(video.next_frame().unwrap().is_none());
}

#[test]
fn test_ffprobe_failure_fails_open() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(
        temp_dir.path(),
        "echo 'Invalid data found when processing input' >&2\nexit 1",
        TWO_FRAMES,
    );

    let err = opener.open(&video_file(temp_dir.path())).err().unwrap();
    assert!(err.to_string().contains("Invalid data found"));
}

#[test]
fn test_ffprobe_without_video_stream() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(
        temp_dir.path(),
        r#"echo '{"streams":[{"codec_type":"audio"}]}'"#,
        TWO_FRAMES,
    );

    let err = opener.open(&video_file(temp_dir.path())).err().unwrap();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn test_ffmpeg_failure_is_an_error() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(
        temp_dir.path(),
        FFPROBE_2X1,
        "echo 'Unrecognized option fps_mode' >&2\nexit 1",
    );

    let mut video = opener.open(&video_file(temp_dir.path())).unwrap();
    let err = video.next_frame().unwrap_err();
    assert!(err.to_string().contains("exit code Some(1)"));
    assert!(err.to_string().contains("Unrecognized option fps_mode"));
}

#[test]
fn test_ffmpeg_failure_after_frames() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(
        temp_dir.path(),
        FFPROBE_2X1,
        r"printf '\001\002\003\004\005\006'
echo 'corrupt packet' >&2
exit 1",
    );

    let mut video = opener.open(&video_file(temp_dir.path())).unwrap();
    assert!(video.next_frame().unwrap().is_some());
    assert!(video.next_frame().is_err());
}

#[test]
fn test_ffmpeg_truncated_frame_is_an_error() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(temp_dir.path(), FFPROBE_2X1, r"printf '\001\002\003\004'");

    let mut video = opener.open(&video_file(temp_dir.path())).unwrap();
    let err = video.next_frame().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_export_with_ffmpeg_decoder() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(temp_dir.path(), FFPROBE_2X1, TWO_FRAMES);

    let mut tracking_results = BTreeMap::new();
    tracking_results.insert(1, single_pixel_record());
    tracking_results.insert(5, single_pixel_record());

    let archive = YoloExporter::with_opener(opener)
        .create_zip_in_memory("ff", &video_file(temp_dir.path()), &tracking_results, true)
        .unwrap();

    let zip = zip::ZipArchive::new(Cursor::new(archive.as_slice())).unwrap();
    let images: Vec<_> = zip
        .file_names()
        .filter(|name| name.contains("/images/"))
        .collect();
    assert_eq!(images, vec!["session_ff/images/frame_0001.jpg"]);
}

#[test]
fn test_export_with_failing_ffmpeg_keeps_labels() {
    let _guard = serial();
    let temp_dir = tempfile::tempdir().unwrap();
    let opener = fake_opener(temp_dir.path(), FFPROBE_2X1, "echo 'boom' >&2\nexit 1");

    let mut tracking_results = BTreeMap::new();
    tracking_results.insert(0, single_pixel_record());

    let archive = YoloExporter::with_opener(opener)
        .create_zip_in_memory("bad", &video_file(temp_dir.path()), &tracking_results, true)
        .unwrap();

    let zip = zip::ZipArchive::new(Cursor::new(archive.as_slice())).unwrap();
    let names: Vec<_> = zip.file_names().collect();
    assert!(names.contains(&"session_bad/labels/frame_0000.txt"));
    assert!(!names.iter().any(|name| name.contains("/images/")));
}
