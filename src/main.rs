mod convert;
mod core;
mod tools;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::convert::{clean_stray_artifacts, ConvertWorker};
use crate::core::{AppConfig, ConvertEvent, ConvertOutcome, ConvertRequest};
use crate::tools::Tool;

/// Extract every frame of a video into numbered JPEGs, ready for labelme.
#[derive(Debug, Parser)]
#[command(name = "frame-helper", version)]
struct Args {
    /// Source video file
    video: PathBuf,

    /// Directory for the extracted frames (default: a sibling directory named
    /// after the video)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Launch labelme on the frames once extraction finishes
    #[arg(long)]
    labelme: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Could not load config, using defaults: {}", e);
        AppConfig::default()
    });

    let ffmpeg = tools::resolve(Tool::Ffmpeg, &config).ok_or_else(|| {
        anyhow::anyhow!(
            "tool not found: ffmpeg (install it, or set {})",
            Tool::Ffmpeg.env_var()
        )
    })?;

    let output_dir = args
        .output
        .unwrap_or_else(|| default_output_dir(&args.video));

    let request = ConvertRequest::new(args.video, output_dir.clone(), ffmpeg);
    let mut events = ConvertWorker::spawn(request);

    let mut outcome = None;
    while let Some(event) = events.blocking_recv() {
        match event {
            ConvertEvent::Indeterminate => println!("Extracting frames..."),
            ConvertEvent::Percent(percent) => println!("{percent}%"),
            ConvertEvent::Status(text) => println!("{text}"),
            ConvertEvent::Finished(result) => {
                outcome = Some(result);
                break;
            }
        }
    }

    match outcome {
        Some(ConvertOutcome::Success { frame_count }) => {
            clean_stray_artifacts(&output_dir);
            println!(
                "Extracted {} frames into {}",
                frame_count,
                output_dir.display()
            );
        }
        Some(ConvertOutcome::Failure { message }) => {
            anyhow::bail!("{message}");
        }
        None => anyhow::bail!("conversion worker exited without reporting an outcome"),
    }

    if args.labelme {
        // The annotation tool should only ever see canonical files
        clean_stray_artifacts(&output_dir);
        tools::launch_labelme(&config)?;
        println!("labelme launched");
    }

    Ok(())
}

/// Sibling directory named after the video, e.g. `clips/take1.mp4` ->
/// `clips/take1`.
fn default_output_dir(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "frames".into());
    video
        .parent()
        .map(|p| p.join(&stem))
        .unwrap_or_else(|| PathBuf::from(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir_uses_video_stem() {
        assert_eq!(
            default_output_dir(Path::new("/videos/take1.mp4")),
            PathBuf::from("/videos/take1")
        );
        assert_eq!(
            default_output_dir(Path::new("take1.mp4")),
            PathBuf::from("take1")
        );
    }
}
