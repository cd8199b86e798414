//! Lossless time-range extraction via ffmpeg.

use super::process::run_tool;
use super::SegmentCutter;
use crate::error::{RelayError, Result};
use crate::segment::TimeRange;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Cutter backed by `ffmpeg -c copy`.
///
/// Only stream copy is attempted; a failed copy fails the segment rather
/// than silently re-encoding it.
pub struct FfmpegCutter {
    timeout: Duration,
}

impl FfmpegCutter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(source: &Path, range: &TimeRange, dest: &Path) -> Command {
        let mut command = Command::new("ffmpeg");
        command
            .arg("-ss").arg(format!("{:.3}", range.start_seconds))
            .arg("-i").arg(source)
            .arg("-t").arg(format!("{:.3}", range.length_seconds))
            .arg("-map").arg("0:a")
            .arg("-c").arg("copy")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest);
        command
    }
}

#[async_trait]
impl SegmentCutter for FfmpegCutter {
    #[instrument(skip(self, source, dest), fields(start = range.start_seconds, length = range.length_seconds))]
    async fn cut(&self, index: usize, source: &Path, range: &TimeRange, dest: &Path) -> Result<()> {
        let command = Self::command(source, range, dest);

        run_tool("ffmpeg", command, self.timeout)
            .await
            .map_err(|e| RelayError::SegmentCutFailed {
                index,
                reason: e.to_string(),
            })?;

        if !dest.is_file() {
            return Err(RelayError::SegmentCutFailed {
                index,
                reason: format!("ffmpeg reported success but {} is missing", dest.display()),
            });
        }

        debug!("Created segment {} at offset {:.1}s", index, range.start_seconds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_uses_stream_copy() {
        let command = FfmpegCutter::command(
            Path::new("/tmp/in.mp3"),
            &TimeRange::new(2140.8427, 1459.1573),
            Path::new("/tmp/out.mp3"),
        );

        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0..2], ["-ss", "2140.843"]);
        assert!(args.windows(2).any(|w| w == ["-t", "1459.157"]));
        assert!(args.windows(2).any(|w| w == ["-c", "copy"]));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp3"));
    }

    #[tokio::test]
    async fn test_failure_is_reported_for_the_segment() {
        let dir = tempfile::tempdir().unwrap();
        let cutter = FfmpegCutter::new(Duration::from_secs(10));

        let result = cutter
            .cut(
                2,
                &dir.path().join("missing.mp3"),
                &TimeRange::new(0.0, 1.0),
                &dir.path().join("out.mp3"),
            )
            .await;

        assert!(matches!(result, Err(RelayError::SegmentCutFailed { index: 2, .. })));
    }
}
