//! Stream measurements via ffprobe.

use super::process::run_tool;
use crate::error::{RelayError, Result};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Duration and average bit rate of an audio file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub duration_seconds: Option<f64>,
    pub bit_rate_bps: Option<f64>,
}

/// Queries duration and bit rate of an audio file using ffprobe with JSON output.
pub async fn probe_stream(path: &Path, timeout: Duration) -> Result<StreamInfo> {
    let mut command = Command::new("ffprobe");
    command
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path);

    let output = run_tool("ffprobe", command, timeout).await?;
    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the `format` section of ffprobe's JSON output.
///
/// ffprobe reports numbers as strings; fields that are missing, malformed
/// or non-positive come back as `None`.
pub fn parse_probe_output(json_str: &str) -> Result<StreamInfo> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| RelayError::ToolFailed {
            tool: "ffprobe".to_string(),
            detail: "Invalid ffprobe output".to_string(),
        })?;

    let field = |name: &str| {
        parsed["format"][name]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| parsed["format"][name].as_f64())
            .filter(|v| v.is_finite() && *v > 0.0)
    };

    Ok(StreamInfo {
        duration_seconds: field("duration"),
        bit_rate_bps: field("bit_rate"),
    })
}
