//! External media tools: download, measurement and cutting.
//!
//! yt-dlp, ffprobe and ffmpeg sit behind the [`MediaFetcher`] and
//! [`SegmentCutter`] traits so the orchestrator can be driven without them.

mod cutter;
mod fetcher;
mod probe;
pub mod process;

pub use cutter::FfmpegCutter;
pub use fetcher::{locate_asset, parse_video_info, VideoInfo, YtDlpFetcher, YtDlpOptions};
pub use probe::{parse_probe_output, probe_stream, StreamInfo};

use crate::error::Result;
use crate::segment::TimeRange;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// How the fetched file was found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetLocation {
    /// The file was at the path derived from the title.
    Exact,
    /// The derived path was missing; a directory scan found the file.
    FallbackScan,
}

/// A downloaded and transcoded audio file plus the metadata the planner needs.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub local_path: PathBuf,
    /// Title as reported by the host, before normalization.
    pub title: String,
    pub duration_seconds: f64,
    pub bit_rate_bps: f64,
    pub location: AssetLocation,
}

impl FetchedAsset {
    /// Extension of the local file, defaulting to `mp3`.
    pub fn extension(&self) -> &str {
        self.local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp3")
    }
}

/// Retrieves remote media as a single local audio file.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `link` into `output_dir` and describe the result.
    async fn fetch(&self, link: &str, output_dir: &Path) -> Result<FetchedAsset>;
}

/// Extracts a time range from a media file without re-encoding.
#[async_trait]
pub trait SegmentCutter: Send + Sync {
    /// Write the `range` of `source` to `dest`. Failures are reported as
    /// `SegmentCutFailed` for `index`.
    async fn cut(&self, index: usize, source: &Path, range: &TimeRange, dest: &Path) -> Result<()>;
}
