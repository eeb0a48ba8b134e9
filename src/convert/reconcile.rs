use std::fs;
use std::path::Path;

/// Remove extractor-generated transient artifacts from an output directory.
///
/// Some extractor configurations leave hidden partial writes behind (names
/// like `.partial_0001.jpg`). This pass deletes any direct child that is a
/// regular file starting with `.` and ending in `.jpg`, leaving the canonical
/// frame sequence and unrelated files alone. It is a hygiene pass: errors are
/// logged and swallowed, never surfaced to the caller.
pub fn clean_stray_artifacts(dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping artifact cleanup of {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_stray_artifact(name) {
            continue;
        }

        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => log::info!("Removed stray artifact {}", path.display()),
            Err(e) => log::debug!("Failed to remove stray artifact {}: {}", path.display(), e),
        }
    }
}

fn is_stray_artifact(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".jpg")
}
