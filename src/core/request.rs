use std::path::PathBuf;
use thiserror::Error;

/// A single conversion job: one source video, one output directory.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
}

impl ConvertRequest {
    pub fn new(video_path: PathBuf, output_dir: PathBuf, ffmpeg_path: PathBuf) -> Self {
        Self {
            video_path,
            output_dir,
            ffmpeg_path,
        }
    }
}

/// Terminal result of a conversion run. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    Success { frame_count: usize },
    Failure { message: String },
}

/// Event emitted by the conversion worker. Non-terminal events arrive in
/// emission order; the stream ends with exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertEvent {
    /// Work is ongoing but the total is unknown.
    Indeterminate,
    /// Known fraction complete, 0-100.
    Percent(u8),
    /// Human-readable phase label.
    Status(String),
    Finished(ConvertOutcome),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("tool not found: {}", .0.display())]
    ToolNotFound(PathBuf),
    #[error("failed to create output directory {}: {}", .0.display(), .1)]
    CreateDirFailed(PathBuf, std::io::Error),
    #[error("{0}")]
    ExtractionFailed(String),
    #[error("frame count {0} exceeds the {max} frame limit", max = crate::convert::MAX_FRAMES)]
    TooManyFrames(usize),
}
