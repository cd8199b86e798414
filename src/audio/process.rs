//! Bounded execution of external command-line tools.

use crate::error::{RelayError, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Runs `command` to completion and returns its output.
///
/// A missing binary maps to `ToolNotFound`, an expired deadline to
/// `ExternalToolTimeout` (the child is killed), and a non-zero exit to
/// `ToolFailed` carrying the tool's stderr.
pub async fn run_tool(tool: &str, mut command: Command, timeout: Duration) -> Result<Output> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {} with a {}s timeout", tool, timeout.as_secs());

    let result = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result,
        Err(_) => {
            return Err(RelayError::ExternalToolTimeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RelayError::ToolNotFound(tool.to_string()));
        }
        Err(e) => {
            return Err(RelayError::ToolFailed {
                tool: tool.to_string(),
                detail: format!("execution failed: {e}"),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RelayError::ToolFailed {
            tool: tool.to_string(),
            detail: format!("{} ({})", stderr.trim(), output.status),
        });
    }

    Ok(output)
}
