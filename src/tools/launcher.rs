use crate::core::AppConfig;
use crate::tools::{self, Tool};
use std::path::Path;
use std::process::{Command, Stdio};

/// Locale forced onto launched tools so their display text is consistent
/// regardless of the user's shell environment.
const TOOL_LOCALE: &str = "C.UTF-8";

/// Spawn a child process and immediately forget about it.
///
/// Output streams are discarded and the child's lifetime is not tracked; our
/// responsibility ends at a successful spawn.
pub fn launch_detached(executable: &Path, args: &[&str]) -> anyhow::Result<()> {
    Command::new(executable)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .env("LANG", TOOL_LOCALE)
        .env("LC_ALL", TOOL_LOCALE)
        .spawn()
        .map_err(|e| {
            anyhow::anyhow!("Failed to launch {}: {}", executable.display(), e)
        })?;

    log::info!("Launched {} {}", executable.display(), args.join(" "));
    Ok(())
}

/// Start the labelme annotation tool via uvx, detached from this process.
pub fn launch_labelme(config: &AppConfig) -> anyhow::Result<()> {
    let uvx = tools::resolve(Tool::Uvx, config).ok_or_else(|| {
        anyhow::anyhow!(
            "tool not found: uvx (install uv, or set {})",
            Tool::Uvx.env_var()
        )
    })?;
    launch_detached(&uvx, &["labelme"])
}
