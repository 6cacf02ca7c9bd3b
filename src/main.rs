use clap::Parser;

use log::{error, info};
use std::fs;

use mask2yolo::utils::read_tracking_results;
use mask2yolo::{Args, YoloExporter};

fn main() {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.tracking_file.exists() {
        error!(
            "The specified tracking_file does not exist: {}",
            args.tracking_file.display()
        );
        return;
    }

    let Some(tracking_results) = read_tracking_results(&args.tracking_file) else {
        return;
    };

    info!("Starting the export process...");

    let exporter = YoloExporter::with_opener(args.video_opener()).show_progress(!args.no_progress);
    let archive = match exporter.create_zip_in_memory(
        &args.session_id,
        &args.video_path(),
        &tracking_results,
        args.extract_frames,
    ) {
        Ok(archive) => archive,
        Err(e) => {
            error!("Failed to build archive: {}", e);
            return;
        }
    };

    let output_path = args.output_path();
    match fs::write(&output_path, &archive) {
        Ok(()) => info!(
            "Wrote {} bytes to {}",
            archive.len(),
            output_path.display()
        ),
        Err(e) => error!("Failed to write {}: {}", output_path.display(), e),
    }
}
