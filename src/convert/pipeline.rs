use crate::core::{ConvertError, ConvertEvent, ConvertOutcome, ConvertRequest};
use crate::tools;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread;
use tokio::sync::mpsc;

/// Sanity bound against runaway or corrupt input, not a performance limit.
pub const MAX_FRAMES: usize = 999_999;

/// Output pattern handed to ffmpeg; frames are zero-based and zero-padded.
const FRAME_PATTERN: &str = "img_%05d.jpg";

/// Runs one conversion on a dedicated thread, reporting through a channel.
pub struct ConvertWorker;

impl ConvertWorker {
    /// Start converting and return the event stream. The stream yields zero or
    /// more progress events in emission order and ends with exactly one
    /// `Finished`. The worker blocks on the extractor's exit status with no
    /// timeout; a hung extractor blocks that conversion indefinitely.
    pub fn spawn(request: ConvertRequest) -> mpsc::UnboundedReceiver<ConvertEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::spawn(move || {
            let outcome = match run(&request, &tx) {
                Ok(frame_count) => ConvertOutcome::Success { frame_count },
                Err(e) => {
                    log::warn!("Conversion of {} failed: {}", request.video_path.display(), e);
                    ConvertOutcome::Failure {
                        message: e.to_string(),
                    }
                }
            };
            send_event(&tx, ConvertEvent::Finished(outcome));
        });

        rx
    }
}

fn run(
    request: &ConvertRequest,
    events: &mpsc::UnboundedSender<ConvertEvent>,
) -> Result<usize, ConvertError> {
    if !request.video_path.exists() {
        return Err(ConvertError::SourceNotFound(request.video_path.clone()));
    }
    if !tools::is_executable(&request.ffmpeg_path) {
        return Err(ConvertError::ToolNotFound(request.ffmpeg_path.clone()));
    }
    fs::create_dir_all(&request.output_dir)
        .map_err(|e| ConvertError::CreateDirFailed(request.output_dir.clone(), e))?;

    // Total frame count is unknown until the extractor has run
    send_event(events, ConvertEvent::Indeterminate);
    send_event(events, ConvertEvent::Status("starting".to_string()));

    log::info!(
        "Extracting frames from {} into {}",
        request.video_path.display(),
        request.output_dir.display()
    );

    let output = Command::new(&request.ffmpeg_path)
        .arg("-y")
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(&request.video_path)
        .arg("-vsync")
        .arg("0")
        .arg("-q:v")
        .arg("2")
        .arg("-start_number")
        .arg("0")
        .arg(request.output_dir.join(FRAME_PATTERN))
        .output()
        .map_err(|e| {
            ConvertError::ExtractionFailed(format!(
                "Failed to run {}: {}",
                request.ffmpeg_path.display(),
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = stderr.trim();
        let message = if diagnostic.is_empty() {
            "frame extraction failed".to_string()
        } else {
            diagnostic.to_string()
        };
        return Err(ConvertError::ExtractionFailed(message));
    }

    // The extractor's own reporting is not trusted; the files on disk are
    let frame_count = count_frames(&request.output_dir)?;
    enforce_frame_ceiling(frame_count)?;

    send_event(events, ConvertEvent::Percent(100));
    send_event(events, ConvertEvent::Status("done".to_string()));
    log::info!("Extracted {} frames", frame_count);

    Ok(frame_count)
}

fn send_event(events: &mpsc::UnboundedSender<ConvertEvent>, event: ConvertEvent) {
    if events.send(event).is_err() {
        log::debug!("Conversion event receiver is gone, dropping event");
    }
}

/// Count the files in `dir` that belong to the canonical frame sequence.
fn count_frames(dir: &Path) -> Result<usize, ConvertError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ConvertError::ExtractionFailed(format!(
            "Failed to read output directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let mut count = 0;
    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_canonical_frame(name) {
            count += 1;
        }
    }
    Ok(count)
}

/// `img_` + at least five ASCII digits + `.jpg`. ffmpeg widens the field past
/// five digits instead of wrapping, so longer runs still match.
fn is_canonical_frame(name: &str) -> bool {
    name.strip_prefix("img_")
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .map(|digits| digits.len() >= 5 && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

fn enforce_frame_ceiling(count: usize) -> Result<(), ConvertError> {
    if count > MAX_FRAMES {
        return Err(ConvertError::TooManyFrames(count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_frame_matching() {
        assert!(is_canonical_frame("img_00000.jpg"));
        assert!(is_canonical_frame("img_99999.jpg"));
        assert!(is_canonical_frame("img_123456.jpg")); // widened field

        assert!(!is_canonical_frame("img_0000.jpg")); // too short
        assert!(!is_canonical_frame("img_0000a.jpg"));
        assert!(!is_canonical_frame("img_00000.png"));
        assert!(!is_canonical_frame("frame_00000.jpg"));
        assert!(!is_canonical_frame(".partial_0001.jpg"));
        assert!(!is_canonical_frame("img_.jpg"));
    }

    #[test]
    fn test_frame_ceiling() {
        assert!(enforce_frame_ceiling(0).is_ok());
        assert!(enforce_frame_ceiling(MAX_FRAMES).is_ok());
        assert!(enforce_frame_ceiling(MAX_FRAMES + 1).is_err());
    }

    #[test]
    fn test_count_frames_ignores_non_canonical_files() {
        let dir = TempDir::new().unwrap();
        for name in ["img_00000.jpg", "img_00001.jpg", "img_00002.jpg"] {
            std::fs::write(dir.path().join(name), "jpeg").unwrap();
        }
        std::fs::write(dir.path().join(".partial_0001.jpg"), "partial").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "notes").unwrap();
        std::fs::create_dir(dir.path().join("img_00003.jpg")).unwrap(); // not a file

        assert_eq!(count_frames(dir.path()).unwrap(), 3);
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use tempfile::TempDir;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        // Ignores every flag and materializes frames from the trailing
        // output-pattern argument, like the real extractor would
        fn write_frame_producer(dir: &Path, frames: usize) -> PathBuf {
            let body = format!(
                "for last in \"$@\"; do :; done\n\
                 i=0\n\
                 while [ \"$i\" -lt {} ]; do\n\
                 : > \"$(printf \"$last\" \"$i\")\"\n\
                 i=$((i+1))\n\
                 done\n",
                frames
            );
            write_script(dir, &body)
        }

        fn collect_events(mut rx: mpsc::UnboundedReceiver<ConvertEvent>) -> Vec<ConvertEvent> {
            let mut events = Vec::new();
            while let Some(event) = rx.blocking_recv() {
                let finished = matches!(event, ConvertEvent::Finished(_));
                events.push(event);
                if finished {
                    break;
                }
            }
            events
        }

        fn failure_message(events: &[ConvertEvent]) -> &str {
            match events.last() {
                Some(ConvertEvent::Finished(ConvertOutcome::Failure { message })) => message,
                other => panic!("expected a terminal failure, got {:?}", other),
            }
        }

        #[test]
        fn test_successful_conversion_event_order() {
            let dir = TempDir::new().unwrap();
            let video = dir.path().join("sample.mp4");
            std::fs::write(&video, "not really a video").unwrap();
            let ffmpeg = write_frame_producer(dir.path(), 10);
            let output_dir = dir.path().join("frames");

            let request = ConvertRequest::new(video, output_dir.clone(), ffmpeg);
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(
                events,
                vec![
                    ConvertEvent::Indeterminate,
                    ConvertEvent::Status("starting".to_string()),
                    ConvertEvent::Percent(100),
                    ConvertEvent::Status("done".to_string()),
                    ConvertEvent::Finished(ConvertOutcome::Success { frame_count: 10 }),
                ]
            );
            assert!(output_dir.join("img_00000.jpg").exists());
            assert!(output_dir.join("img_00009.jpg").exists());
        }

        #[test]
        fn test_missing_source_fails_before_any_work() {
            let dir = TempDir::new().unwrap();
            let ffmpeg = write_frame_producer(dir.path(), 10);
            let output_dir = dir.path().join("frames");

            let request = ConvertRequest::new(
                dir.path().join("missing.mp4"),
                output_dir.clone(),
                ffmpeg,
            );
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(events.len(), 1);
            assert!(failure_message(&events).contains("source not found"));
            assert!(!output_dir.exists());
        }

        #[test]
        fn test_unresolvable_tool_fails_before_touching_destination() {
            let dir = TempDir::new().unwrap();
            let video = dir.path().join("sample.mp4");
            std::fs::write(&video, "not really a video").unwrap();
            let output_dir = dir.path().join("frames");

            let request = ConvertRequest::new(
                video,
                output_dir.clone(),
                dir.path().join("no-such-ffmpeg"),
            );
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(events.len(), 1);
            assert!(failure_message(&events).contains("tool not found"));
            assert!(!output_dir.exists());
        }

        #[test]
        fn test_extractor_diagnostics_are_forwarded() {
            let dir = TempDir::new().unwrap();
            let video = dir.path().join("sample.mp4");
            std::fs::write(&video, "not really a video").unwrap();
            let ffmpeg = write_script(dir.path(), "echo 'Invalid data found' >&2\nexit 1\n");

            let request = ConvertRequest::new(video, dir.path().join("frames"), ffmpeg);
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(failure_message(&events), "Invalid data found");
        }

        #[test]
        fn test_silent_extractor_failure_gets_generic_message() {
            let dir = TempDir::new().unwrap();
            let video = dir.path().join("sample.mp4");
            std::fs::write(&video, "not really a video").unwrap();
            let ffmpeg = write_script(dir.path(), "exit 1\n");

            let request = ConvertRequest::new(video, dir.path().join("frames"), ffmpeg);
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(failure_message(&events), "frame extraction failed");
        }

        #[test]
        fn test_frame_count_comes_from_disk_not_extractor_output() {
            let dir = TempDir::new().unwrap();
            let video = dir.path().join("sample.mp4");
            std::fs::write(&video, "not really a video").unwrap();
            // Claims 500 frames on stdout but writes 3
            let body = "for last in \"$@\"; do :; done\n\
                        echo 'frame=  500'\n\
                        i=0\n\
                        while [ \"$i\" -lt 3 ]; do\n\
                        : > \"$(printf \"$last\" \"$i\")\"\n\
                        i=$((i+1))\n\
                        done\n";
            let ffmpeg = write_script(dir.path(), body);

            let request = ConvertRequest::new(video, dir.path().join("frames"), ffmpeg);
            let events = collect_events(ConvertWorker::spawn(request));

            assert_eq!(
                events.last(),
                Some(&ConvertEvent::Finished(ConvertOutcome::Success {
                    frame_count: 3
                }))
            );
        }
    }
}
