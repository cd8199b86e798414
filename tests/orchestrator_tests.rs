//! Orchestrator tests
//!
//! Drive the full request pipeline with in-process stand-ins for yt-dlp,
//! ffmpeg and Telegram, and check delivery order, per-segment failures and
//! cleanup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tubecast::audio::{AssetLocation, FetchedAsset, MediaFetcher, SegmentCutter};
use tubecast::audio_source::MediaRequest;
use tubecast::config::Settings;
use tubecast::orchestrator::{
    Orchestrator, SegmentOutcome, Stage, PLANNING_FAILED_TEXT, STATUS_DOWNLOADING,
};
use tubecast::segment::TimeRange;
use tubecast::telegram::{handle_text, AudioAttachment, Messenger, HELP_TEXT, INVALID_LINK_TEXT};
use tubecast::{RelayError, Result};

// ============================================================================
// Test doubles
// ============================================================================

/// Writes a fake mp3 named after the title, like yt-dlp would.
struct FakeFetcher {
    title: String,
    duration_seconds: f64,
    bit_rate_bps: f64,
    /// File name to write instead of `<title>.mp3`, forcing the fallback scan.
    written_name: Option<String>,
}

impl FakeFetcher {
    fn new(title: &str, duration_seconds: f64, bit_rate_bps: f64) -> Self {
        Self {
            title: title.to_string(),
            duration_seconds,
            bit_rate_bps,
            written_name: None,
        }
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, _link: &str, output_dir: &Path) -> Result<FetchedAsset> {
        let name = self
            .written_name
            .clone()
            .unwrap_or_else(|| format!("{}.mp3", self.title));
        std::fs::write(output_dir.join(&name), b"full audio stream")?;

        let (local_path, location) = tubecast::audio::locate_asset(output_dir, &self.title, "mp3")?;

        Ok(FetchedAsset {
            local_path,
            title: self.title.clone(),
            duration_seconds: self.duration_seconds,
            bit_rate_bps: self.bit_rate_bps,
            location,
        })
    }
}

/// Leaves a partial download behind and then fails.
struct FailingFetcher;

#[async_trait]
impl MediaFetcher for FailingFetcher {
    async fn fetch(&self, _link: &str, output_dir: &Path) -> Result<FetchedAsset> {
        std::fs::write(output_dir.join("Song.webm.part"), b"partial")?;
        Err(RelayError::ToolFailed {
            tool: "yt-dlp".to_string(),
            detail: "ERROR: [youtube] Video unavailable at /srv/secret/path".to_string(),
        })
    }
}

/// Writes segment files with a configurable size per index.
#[derive(Default)]
struct FakeCutter {
    sizes: HashMap<usize, usize>,
    failing: Vec<usize>,
    cuts: Mutex<Vec<(usize, TimeRange, PathBuf)>>,
}

impl FakeCutter {
    fn with_sizes(sizes: &[(usize, usize)]) -> Self {
        Self {
            sizes: sizes.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn cut_paths(&self) -> Vec<PathBuf> {
        self.cuts.lock().unwrap().iter().map(|(_, _, p)| p.clone()).collect()
    }
}

#[async_trait]
impl SegmentCutter for FakeCutter {
    async fn cut(&self, index: usize, source: &Path, range: &TimeRange, dest: &Path) -> Result<()> {
        assert!(source.is_file(), "source must exist while cutting");
        if self.failing.contains(&index) {
            return Err(RelayError::SegmentCutFailed {
                index,
                reason: "ffmpeg exited with 1".to_string(),
            });
        }

        let size = self.sizes.get(&index).copied().unwrap_or(10);
        std::fs::write(dest, vec![0u8; size])?;
        self.cuts
            .lock()
            .unwrap()
            .push((index, *range, dest.to_path_buf()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text(String),
    Audio { file_name: String, caption: Option<String> },
}

#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingMessenger {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn audio_names(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Audio { file_name, .. } => Some(file_name),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, _chat_id: i64, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_audio(&self, _chat_id: i64, audio: &AudioAttachment) -> Result<()> {
        assert!(audio.path.is_file(), "attachment must exist when sent");
        self.sent.lock().unwrap().push(Sent::Audio {
            file_name: audio.file_name.clone(),
            caption: audio.caption.clone(),
        });
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Settings with a 100 byte ceiling; at 80 bit/s that is 10 seconds per part.
fn test_settings(root: &TempDir) -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.general.temp_dir = root.path().to_string_lossy().into_owned();
    settings.delivery.size_limit_bytes = 100;
    Arc::new(settings)
}

fn request() -> MediaRequest {
    MediaRequest {
        source_link: "https://youtu.be/dQw4w9WgXcQ".to_string(),
    }
}

fn remaining_entries(root: &TempDir) -> usize {
    std::fs::read_dir(root.path()).unwrap().count()
}

// ============================================================================
// Pipeline tests
// ============================================================================

#[tokio::test]
async fn test_single_segment_is_sent_unlabelled() {
    let root = tempfile::tempdir().unwrap();
    let cutter = Arc::new(FakeCutter::with_sizes(&[(1, 60)]));
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FakeFetcher::new("Моя Песня!!", 8.0, 80.0)),
        cutter.clone(),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(report.is_done());
    assert_eq!(report.asset_location, Some(AssetLocation::Exact));
    assert_eq!(report.delivered(), vec![1]);
    assert_eq!(
        messenger.sent(),
        vec![
            Sent::Text(STATUS_DOWNLOADING.to_string()),
            Sent::Audio {
                file_name: "Moja_Pesnja.mp3".to_string(),
                caption: None,
            },
        ]
    );

    // Even a single part goes through the cutter, covering the whole stream.
    let cuts = cutter.cuts.lock().unwrap().clone();
    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].1, TimeRange::new(0.0, 8.0));

    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_oversized_middle_segment_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let cutter = Arc::new(FakeCutter::with_sizes(&[(1, 90), (2, 150), (3, 40)]));
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FakeFetcher::new("Song", 25.0, 80.0)),
        cutter.clone(),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(report.is_done());
    assert_eq!(report.segments.len(), 3);
    assert_eq!(report.delivered(), vec![1, 3]);
    assert_eq!(report.segments[1].outcome, SegmentOutcome::Oversized);
    assert_eq!(report.segments[1].size_bytes, Some(150));

    assert_eq!(
        messenger.audio_names(),
        vec![
            "Part 1 - Song_part_001.mp3".to_string(),
            "Part 3 - Song_part_003.mp3".to_string(),
        ]
    );
    assert!(messenger
        .texts()
        .iter()
        .any(|t| t.contains("Part 2") && t.contains("too large")));

    // Ranges are chronological and contiguous.
    let cuts = cutter.cuts.lock().unwrap().clone();
    let ranges: Vec<TimeRange> = cuts.iter().map(|(_, r, _)| *r).collect();
    assert_eq!(
        ranges,
        vec![
            TimeRange::new(0.0, 10.0),
            TimeRange::new(10.0, 10.0),
            TimeRange::new(20.0, 5.0),
        ]
    );

    for path in cutter.cut_paths() {
        assert!(!path.exists(), "{} was not cleaned up", path.display());
    }
    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_fetch_failure_cleans_up_and_reports() {
    let root = tempfile::tempdir().unwrap();
    let cutter = Arc::new(FakeCutter::default());
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FailingFetcher),
        cutter.clone(),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(!report.is_done());
    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Fetching);
    assert!(matches!(failure.error, RelayError::ToolFailed { .. }));

    assert!(messenger.audio_names().is_empty());
    assert!(cutter.cut_paths().is_empty());

    // The user gets a generic message, not the raw tool output.
    let texts = messenger.texts();
    assert_eq!(texts.len(), 2);
    assert!(!texts[1].contains("/srv/secret/path"));

    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_cut_failure_only_affects_that_segment() {
    let root = tempfile::tempdir().unwrap();
    let cutter = Arc::new(FakeCutter {
        failing: vec![1],
        ..Default::default()
    });
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FakeFetcher::new("Song", 15.0, 80.0)),
        cutter,
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(report.is_done());
    assert_eq!(report.segments[0].outcome, SegmentOutcome::CutFailed);
    assert_eq!(report.segments[0].size_bytes, None);
    assert_eq!(report.delivered(), vec![2]);
    assert_eq!(
        messenger.sent().last(),
        Some(&Sent::Audio {
            file_name: "Part 2 - Song_part_002.mp3".to_string(),
            caption: Some("Part 2 of 2".to_string()),
        })
    );
    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_fallback_scan_is_reported() {
    let root = tempfile::tempdir().unwrap();
    let messenger = Arc::new(RecordingMessenger::default());
    let fetcher = FakeFetcher {
        written_name: Some("AC⧸DC - Thunderstruck.mp3".to_string()),
        ..FakeFetcher::new("AC/DC - Thunderstruck", 5.0, 80.0)
    };

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(fetcher),
        Arc::new(FakeCutter::default()),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(report.is_done());
    assert_eq!(report.asset_location, Some(AssetLocation::FallbackScan));
    assert_eq!(messenger.audio_names(), vec!["ACDC_Thunderstruck.mp3".to_string()]);
    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_title_naming_a_file_elsewhere_is_not_sent_or_deleted() {
    let root = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let victim = outside.path().join("victim.mp3");
    std::fs::write(&victim, b"SECRET").unwrap();

    let messenger = Arc::new(RecordingMessenger::default());
    let fetcher = FakeFetcher {
        written_name: Some("Real Download.mp3".to_string()),
        ..FakeFetcher::new(outside.path().join("victim").to_str().unwrap(), 5.0, 80.0)
    };

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(fetcher),
        Arc::new(FakeCutter::default()),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    assert!(report.is_done());
    assert_eq!(report.asset_location, Some(AssetLocation::FallbackScan));
    assert_eq!(messenger.audio_names().len(), 1);
    assert_eq!(std::fs::read(&victim).unwrap(), b"SECRET");
    assert_eq!(remaining_entries(&root), 0);
}

#[tokio::test]
async fn test_invalid_plan_input_fails_at_planning() {
    let root = tempfile::tempdir().unwrap();
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FakeFetcher::new("Song", 10.0, 0.0)),
        Arc::new(FakeCutter::default()),
        messenger.clone(),
    )
    .unwrap();

    let report = orchestrator.process(1, &request()).await;

    let failure = report.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Planning);
    assert!(matches!(failure.error, RelayError::InvalidInput(_)));
    assert_eq!(report.stage, Stage::Cleanup);

    // The link was fine, so the reply must not ask for another one.
    let texts = messenger.texts();
    assert_eq!(texts.last(), Some(&PLANNING_FAILED_TEXT.to_string()));
    assert!(!texts.last().unwrap().contains("link"));
    assert_eq!(remaining_entries(&root), 0);
}

// ============================================================================
// Message handling
// ============================================================================

#[tokio::test]
async fn test_handle_text_replies_without_processing() {
    let root = tempfile::tempdir().unwrap();
    let messenger = Arc::new(RecordingMessenger::default());
    let cutter = Arc::new(FakeCutter::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FailingFetcher),
        cutter.clone(),
        messenger.clone(),
    )
    .unwrap();
    let limiter = Semaphore::new(1);

    handle_text(messenger.as_ref(), &orchestrator, &limiter, 1, "/start").await;
    handle_text(messenger.as_ref(), &orchestrator, &limiter, 1, "just chatting").await;

    assert_eq!(
        messenger.texts(),
        vec![HELP_TEXT.to_string(), INVALID_LINK_TEXT.to_string()]
    );
    assert!(cutter.cut_paths().is_empty());
}

#[tokio::test]
async fn test_handle_text_runs_pipeline_for_links() {
    let root = tempfile::tempdir().unwrap();
    let messenger = Arc::new(RecordingMessenger::default());

    let orchestrator = Orchestrator::with_components(
        test_settings(&root),
        Arc::new(FakeFetcher::new("Song", 5.0, 80.0)),
        Arc::new(FakeCutter::default()),
        messenger.clone(),
    )
    .unwrap();
    let limiter = Semaphore::new(1);

    handle_text(
        messenger.as_ref(),
        &orchestrator,
        &limiter,
        1,
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    )
    .await;

    assert_eq!(messenger.audio_names(), vec!["Song.mp3".to_string()]);
    assert_eq!(limiter.available_permits(), 1);
}
