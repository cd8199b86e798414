//! Audio download via yt-dlp.
//!
//! yt-dlp fetches the best available audio stream and transcodes it with
//! ffmpeg; ffprobe then measures the result so the planner has a duration
//! and bit rate to work with.

use super::probe::probe_stream;
use super::process::run_tool;
use super::{AssetLocation, FetchedAsset, MediaFetcher};
use crate::config::Settings;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Options passed through to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpOptions {
    pub format: String,
    pub audio_format: String,
    pub audio_quality: String,
    pub cookies_file: Option<PathBuf>,
    pub timeout: Duration,
    pub probe_timeout: Duration,
}

impl YtDlpOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            format: settings.fetcher.format.clone(),
            audio_format: settings.fetcher.audio_format.clone(),
            audio_quality: settings.fetcher.audio_quality.clone(),
            cookies_file: settings.cookies_file(),
            timeout: settings.fetch_timeout(),
            probe_timeout: settings.cut_timeout(),
        }
    }
}

/// Fetcher backed by the `yt-dlp` command-line tool.
pub struct YtDlpFetcher {
    options: YtDlpOptions,
}

impl YtDlpFetcher {
    pub fn new(options: YtDlpOptions) -> Self {
        Self { options }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(YtDlpOptions::from_settings(settings))
    }

    fn command(&self, link: &str, output_dir: &Path) -> Command {
        let template = output_dir.join("%(title)s.%(ext)s");

        let mut command = Command::new("yt-dlp");
        command
            .arg("--format").arg(&self.options.format)
            .arg("--extract-audio")
            .arg("--audio-format").arg(&self.options.audio_format)
            .arg("--audio-quality").arg(&self.options.audio_quality)
            .arg("--output").arg(template)
            .arg("--no-playlist")
            .arg("--no-simulate")
            .arg("--dump-json")
            .arg("--no-warnings")
            .arg("--no-progress");

        if let Some(cookies) = &self.options.cookies_file {
            command.arg("--cookies").arg(cookies);
        }

        command.arg(link);
        command
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    #[instrument(skip(self, output_dir), fields(link = %link))]
    async fn fetch(&self, link: &str, output_dir: &Path) -> Result<FetchedAsset> {
        std::fs::create_dir_all(output_dir)?;

        info!("Downloading audio from {}", link);
        let output = run_tool("yt-dlp", self.command(link, output_dir), self.options.timeout).await?;

        let info = parse_video_info(&String::from_utf8_lossy(&output.stdout))?;
        info!("Original title: {}", info.title);

        let (local_path, location) = locate_asset(output_dir, &info.title, &self.options.audio_format)?;

        let stream = probe_stream(&local_path, self.options.probe_timeout).await?;
        let duration_seconds = stream
            .duration_seconds
            .or(info.duration_seconds)
            .ok_or_else(|| RelayError::ToolFailed {
                tool: "ffprobe".to_string(),
                detail: "Could not determine audio duration".to_string(),
            })?;

        let bit_rate_bps = match stream.bit_rate_bps {
            Some(rate) => rate,
            None => {
                let size = std::fs::metadata(&local_path)?.len();
                debug!("No bit rate reported, deriving it from {} bytes", size);
                size as f64 * 8.0 / duration_seconds
            }
        };

        Ok(FetchedAsset {
            local_path,
            title: info.title,
            duration_seconds,
            bit_rate_bps,
            location,
        })
    }
}

/// The fields of yt-dlp's info JSON the relay uses.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub title: String,
    pub duration_seconds: Option<f64>,
}

/// Parses yt-dlp `--dump-json` output.
///
/// With `--no-simulate` the JSON object is printed on its own line; the last
/// line that parses as an object wins.
pub fn parse_video_info(stdout: &str) -> Result<VideoInfo> {
    let json = stdout
        .lines()
        .rev()
        .filter(|line| line.trim_start().starts_with('{'))
        .find_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .ok_or_else(|| RelayError::ToolFailed {
            tool: "yt-dlp".to_string(),
            detail: "No video information in yt-dlp output".to_string(),
        })?;

    let title = json["title"]
        .as_str()
        .unwrap_or("Unknown Title")
        .to_string();

    Ok(VideoInfo {
        title,
        duration_seconds: json["duration"].as_f64(),
    })
}

/// Locates the transcoded file for `title` in `dir`.
///
/// The exact `<title>.<ext>` path is preferred. yt-dlp rewrites characters it
/// considers unsafe, so when that path is missing any file with the right
/// extension is accepted instead and reported as a fallback.
///
/// The title comes from the uploader. It is only used as a single file name
/// that must resolve inside `dir`; anything else goes to the scan.
pub fn locate_asset(dir: &Path, title: &str, extension: &str) -> Result<(PathBuf, AssetLocation)> {
    let file_name = format!("{}.{}", title, extension);

    if let Some(expected) = exact_candidate(dir, &file_name) {
        info!("File found: {}", expected.display());
        return Ok((expected, AssetLocation::Exact));
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| RelayError::AssetNotFound(format!("Cannot read directory: {e}")))?;

    // Symlinks are skipped: only regular files written into `dir` count.
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(path) => {
            warn!(
                event = "AssetFoundByFallbackScan",
                expected = %file_name,
                found = %path.display(),
                "Expected file missing, using the first .{} file found",
                extension
            );
            Ok((path, AssetLocation::FallbackScan))
        }
        None => Err(RelayError::AssetNotFound(format!(
            "{} not found and no .{} file in {}",
            file_name,
            extension,
            dir.display()
        ))),
    }
}

/// `dir/file_name` if `file_name` is one plain path component naming a
/// regular file whose resolved location is directly inside `dir`.
fn exact_candidate(dir: &Path, file_name: &str) -> Option<PathBuf> {
    if file_name.contains(['/', '\\', '\0']) {
        return None;
    }

    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => return None,
    }

    let candidate = dir.join(file_name);
    let metadata = std::fs::symlink_metadata(&candidate).ok()?;
    if !metadata.file_type().is_file() {
        return None;
    }

    let resolved_dir = dir.canonicalize().ok()?;
    let resolved = candidate.canonicalize().ok()?;
    (resolved.parent() == Some(resolved_dir.as_path())).then_some(candidate)
}
