//! Pipeline orchestrator for Tubecast.
//!
//! Coordinates one request from download to delivery:
//! fetch, normalize, plan, cut, size check, send, clean up.

use crate::audio::{AssetLocation, FfmpegCutter, MediaFetcher, SegmentCutter, YtDlpFetcher};
use crate::audio_source::MediaRequest;
use crate::config::Settings;
use crate::error::{RelayError, Result};
use crate::filename::normalize;
use crate::segment::{attachment_name, format_timestamp, plan, segment_file_name, Segment, TimeRange};
use crate::telegram::{AudioAttachment, Messenger};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Sent as soon as a link is accepted.
pub const STATUS_DOWNLOADING: &str = "Downloading and processing the audio, please wait...";

/// Sent when the downloaded audio cannot be split into parts.
pub const PLANNING_FAILED_TEXT: &str =
    "The downloaded audio has no usable length or bit rate, so it could not be split into parts.";

/// Stages of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Fetching,
    Normalizing,
    Planning,
    /// Cutting the segment with this 1-based index.
    Cutting(usize),
    /// Delivering the segment with this 1-based index.
    Delivering(usize),
    Cleanup,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::Fetching => write!(f, "fetching"),
            Stage::Normalizing => write!(f, "normalizing"),
            Stage::Planning => write!(f, "planning"),
            Stage::Cutting(i) => write!(f, "cutting({})", i),
            Stage::Delivering(i) => write!(f, "delivering({})", i),
            Stage::Cleanup => write!(f, "cleanup"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Request-level failure: the stage it happened in and why.
#[derive(Debug)]
pub struct Failure {
    pub stage: Stage,
    pub error: RelayError,
}

/// What happened to one planned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    Delivered,
    /// Cut fine but measured over the size limit; not sent.
    Oversized,
    CutFailed,
    SendFailed,
}

/// Per-segment entry of a [`DeliveryReport`].
#[derive(Debug, Clone)]
pub struct SegmentReport {
    pub index: usize,
    pub range: TimeRange,
    /// Measured size, when the segment was cut.
    pub size_bytes: Option<u64>,
    pub outcome: SegmentOutcome,
}

/// Result of processing one request.
#[derive(Debug)]
pub struct DeliveryReport {
    /// Last stage reached: `Done` on success, `Cleanup` after a failure.
    pub stage: Stage,
    pub failure: Option<Failure>,
    pub asset_location: Option<AssetLocation>,
    /// Ordered by segment index.
    pub segments: Vec<SegmentReport>,
}

impl DeliveryReport {
    fn new() -> Self {
        Self {
            stage: Stage::Received,
            failure: None,
            asset_location: None,
            segments: Vec::new(),
        }
    }

    /// Whether the request reached `Done`.
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done && self.failure.is_none()
    }

    /// Indices of the segments that were sent.
    pub fn delivered(&self) -> Vec<usize> {
        self.segments
            .iter()
            .filter(|s| s.outcome == SegmentOutcome::Delivered)
            .map(|s| s.index)
            .collect()
    }
}

/// The main orchestrator for the Tubecast pipeline.
pub struct Orchestrator {
    settings: Arc<Settings>,
    fetcher: Arc<dyn MediaFetcher>,
    cutter: Arc<dyn SegmentCutter>,
    messenger: Arc<dyn Messenger>,
    work_root: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator backed by yt-dlp and ffmpeg.
    pub fn new(settings: Arc<Settings>, messenger: Arc<dyn Messenger>) -> Result<Self> {
        let fetcher = Arc::new(YtDlpFetcher::from_settings(&settings));
        let cutter = Arc::new(FfmpegCutter::new(settings.cut_timeout()));
        Self::with_components(settings, fetcher, cutter, messenger)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Arc<Settings>,
        fetcher: Arc<dyn MediaFetcher>,
        cutter: Arc<dyn SegmentCutter>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self> {
        let work_root = settings.temp_dir();
        std::fs::create_dir_all(&work_root)?;

        Ok(Self {
            settings,
            fetcher,
            cutter,
            messenger,
            work_root,
        })
    }

    /// Process one request end to end.
    ///
    /// Never returns an error: failures are reported to the chat and recorded
    /// in the returned report. The request's working directory is removed on
    /// every path.
    #[instrument(skip(self, request), fields(link = %request.source_link))]
    pub async fn process(&self, chat_id: i64, request: &MediaRequest) -> DeliveryReport {
        let mut report = DeliveryReport::new();

        self.notify(chat_id, STATUS_DOWNLOADING).await;

        let result = match tempfile::Builder::new()
            .prefix("request-")
            .tempdir_in(&self.work_root)
        {
            Ok(workdir) => {
                let result = self.run(chat_id, request, workdir.path(), &mut report).await;
                let failed_at = report.stage;

                report.stage = Stage::Cleanup;
                let path = workdir.path().to_path_buf();
                if let Err(e) = workdir.close() {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
                result.map_err(|error| (failed_at, error))
            }
            Err(e) => Err((report.stage, RelayError::Io(e))),
        };

        match result {
            Ok(()) => {
                report.stage = Stage::Done;
                info!(
                    delivered = report.delivered().len(),
                    planned = report.segments.len(),
                    "Request complete"
                );
            }
            Err((stage, error)) => {
                error!(stage = %stage, kind = error.kind(), "Request failed: {}", error);
                let reply = match stage {
                    Stage::Planning => PLANNING_FAILED_TEXT.to_string(),
                    _ => error.user_message(),
                };
                self.notify(chat_id, &reply).await;
                report.failure = Some(Failure { stage, error });
            }
        }

        report
    }

    async fn run(
        &self,
        chat_id: i64,
        request: &MediaRequest,
        workdir: &Path,
        report: &mut DeliveryReport,
    ) -> Result<()> {
        report.stage = Stage::Fetching;
        let asset = self.fetcher.fetch(&request.source_link, workdir).await?;
        report.asset_location = Some(asset.location);
        info!(
            "Fetched '{}' ({}, {:.0} bit/s)",
            asset.title,
            format_timestamp(asset.duration_seconds),
            asset.bit_rate_bps
        );

        report.stage = Stage::Normalizing;
        let title = normalize(&asset.title);
        let extension = asset.extension().to_string();
        let source = workdir.join(format!("{}.{}", title, extension));
        if asset.local_path != source {
            tokio::fs::rename(&asset.local_path, &source).await?;
        }
        info!("Safe file name: {}", title);

        report.stage = Stage::Planning;
        let limit = self.settings.delivery.size_limit_bytes;
        let ranges = plan(asset.duration_seconds, asset.bit_rate_bps, limit as f64)?;
        let total = ranges.len();
        if total > 1 {
            self.notify(
                chat_id,
                &format!("The audio is too large for one message, sending it in {} parts.", total),
            )
            .await;
        }

        let parts_dir = workdir.join("parts");
        tokio::fs::create_dir_all(&parts_dir).await?;

        let mut segments = Vec::with_capacity(total);
        for (i, range) in ranges.iter().enumerate() {
            let index = i + 1;
            report.stage = Stage::Cutting(index);

            let dest = parts_dir.join(segment_file_name(&title, &extension, index, total));
            match self.cut_segment(index, &source, range, &dest).await {
                Ok(segment) => segments.push(segment),
                Err(e) => {
                    warn!(kind = e.kind(), "Segment {} failed: {}", index, e);
                    self.notify(chat_id, &e.user_message()).await;
                    report.segments.push(SegmentReport {
                        index,
                        range: *range,
                        size_bytes: None,
                        outcome: SegmentOutcome::CutFailed,
                    });
                }
            }
        }

        for segment in segments {
            report.stage = Stage::Delivering(segment.index);
            let outcome = self
                .deliver_segment(chat_id, &segment, &title, &extension, total, limit)
                .await;
            report.segments.push(SegmentReport {
                index: segment.index,
                range: segment.range,
                size_bytes: Some(segment.size_bytes),
                outcome,
            });
        }

        report.segments.sort_by_key(|s| s.index);
        Ok(())
    }

    async fn cut_segment(
        &self,
        index: usize,
        source: &Path,
        range: &TimeRange,
        dest: &Path,
    ) -> Result<Segment> {
        self.cutter.cut(index, source, range, dest).await?;

        let size_bytes = tokio::fs::metadata(dest)
            .await
            .map_err(|e| RelayError::SegmentCutFailed {
                index,
                reason: format!("cannot measure {}: {}", dest.display(), e),
            })?
            .len();

        debug!("Segment {} is {} bytes", index, size_bytes);

        Ok(Segment {
            index,
            range: *range,
            size_bytes,
            path: dest.to_path_buf(),
        })
    }

    async fn deliver_segment(
        &self,
        chat_id: i64,
        segment: &Segment,
        title: &str,
        extension: &str,
        total: usize,
        limit: u64,
    ) -> SegmentOutcome {
        if segment.size_bytes > limit {
            let err = RelayError::OversizedSegment {
                index: segment.index,
                size: segment.size_bytes,
                limit,
            };
            warn!(kind = err.kind(), "{}", err);
            self.notify(chat_id, &err.user_message()).await;
            return SegmentOutcome::Oversized;
        }

        let attachment = AudioAttachment {
            path: segment.path.clone(),
            file_name: attachment_name(title, extension, segment.index, total),
            caption: (total > 1).then(|| format!("Part {} of {}", segment.index, total)),
        };

        match self.messenger.send_audio(chat_id, &attachment).await {
            Ok(()) => {
                info!("Sent {}", attachment.file_name);
                SegmentOutcome::Delivered
            }
            Err(e) => {
                error!(kind = e.kind(), "Failed to send segment {}: {}", segment.index, e);
                self.notify(
                    chat_id,
                    &format!("Part {} could not be sent.", segment.index),
                )
                .await;
                SegmentOutcome::SendFailed
            }
        }
    }

    /// Best-effort status message; a failed notification never aborts a request.
    async fn notify(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text).await {
            warn!("Failed to send status message: {}", e);
        }
    }
}
