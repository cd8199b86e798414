//! Pre-flight checks before the bot starts polling.
//!
//! Validates that required tools and configuration are available
//! before accepting requests that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{RelayError, Result};
use std::process::Command;

/// Tools every request depends on.
pub const REQUIRED_TOOLS: &[&str] = &["yt-dlp", "ffmpeg", "ffprobe"];

/// Run all pre-flight checks.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    settings.validate()?;
    for tool in REQUIRED_TOOLS {
        check_tool(tool)?;
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(RelayError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(RelayError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(RelayError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
