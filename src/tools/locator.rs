use crate::core::AppConfig;
use std::env;
use std::path::{Path, PathBuf};

/// External programs the helper shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// The frame-extraction engine.
    Ffmpeg,
    /// The launcher used to start labelme.
    Uvx,
}

impl Tool {
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => {
                if cfg!(windows) {
                    "ffmpeg.exe"
                } else {
                    "ffmpeg"
                }
            }
            Tool::Uvx => {
                if cfg!(windows) {
                    "uvx.exe"
                } else {
                    "uvx"
                }
            }
        }
    }

    /// Environment variable that overrides every other resolution step.
    pub fn env_var(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "FRAME_HELPER_FFMPEG",
            Tool::Uvx => "FRAME_HELPER_UVX",
        }
    }

    fn config_override<'a>(&self, config: &'a AppConfig) -> Option<&'a Path> {
        match self {
            Tool::Ffmpeg => config.ffmpeg_path.as_deref(),
            Tool::Uvx => config.uvx_path.as_deref(),
        }
    }
}

/// Resolve the absolute path of an external tool.
///
/// Resolution order, first match wins: environment variable override, config
/// file override, then the conventional install directories. Nothing is cached
/// between calls, so a tool installed while the app is running is picked up on
/// the next lookup. Returns `None` when no candidate exists; never errors.
pub fn resolve(tool: Tool, config: &AppConfig) -> Option<PathBuf> {
    resolve_with_dirs(tool, config, &search_dirs())
}

fn resolve_with_dirs(tool: Tool, config: &AppConfig, dirs: &[PathBuf]) -> Option<PathBuf> {
    if let Ok(value) = env::var(tool.env_var()) {
        let candidate = Path::new(&value);
        if is_executable(candidate) {
            log::debug!("Resolved {} via {}", tool.binary_name(), tool.env_var());
            return Some(candidate.to_path_buf());
        }
        log::warn!(
            "{} is set but does not name an executable file, ignoring: {}",
            tool.env_var(),
            value
        );
    }

    if let Some(candidate) = tool.config_override(config) {
        if is_executable(candidate) {
            log::debug!("Resolved {} via config override", tool.binary_name());
            return Some(candidate.to_path_buf());
        }
        log::warn!(
            "Config override for {} does not name an executable file, ignoring: {}",
            tool.binary_name(),
            candidate.display()
        );
    }

    for dir in dirs {
        let candidate = dir.join(tool.binary_name());
        if is_executable(&candidate) {
            log::debug!("Resolved {} at {}", tool.binary_name(), candidate.display());
            return Some(candidate);
        }
    }

    None
}

/// Conventional install locations, most specific first. Tools arrive via
/// different mechanisms (pip/uv, homebrew, distro packages, manual installs),
/// so no single directory can be assumed.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs_list.push(home.join(".local").join("bin"));
    }
    dirs_list.push(PathBuf::from("/usr/local/bin"));
    dirs_list.push(PathBuf::from("/opt/homebrew/bin"));
    dirs_list.push(PathBuf::from("/usr/bin"));
    dirs_list
}

pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
