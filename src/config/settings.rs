//! Configuration settings for Tubecast.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Largest attachment the relay will send: 49 MiB, under the Bot API's
/// 50 MB upload cap.
pub const DEFAULT_SIZE_LIMIT_BYTES: u64 = 49 * 1024 * 1024;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub telegram: TelegramSettings,
    pub fetcher: FetcherSettings,
    pub delivery: DeliverySettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory for per-request working directories.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/tubecast".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot access token. Required; usually supplied via `TELEGRAM_TOKEN`.
    pub token: Option<String>,
    /// Base URL of the Bot API.
    pub api_url: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    pub poll_timeout_secs: u64,
    /// Maximum requests processed at the same time.
    pub max_concurrent_requests: usize,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            max_concurrent_requests: 4,
        }
    }
}

/// Media fetcher (yt-dlp) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    /// yt-dlp format selector.
    pub format: String,
    /// Target audio codec / file extension.
    pub audio_format: String,
    /// Target audio quality passed to `--audio-quality`.
    pub audio_quality: String,
    /// Cookie file passed to yt-dlp as `--cookies`.
    pub cookies_file: Option<String>,
    /// Timeout for download and transcode, in seconds.
    pub timeout_secs: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            format: "bestaudio/best".to_string(),
            audio_format: "mp3".to_string(),
            audio_quality: "192K".to_string(),
            cookies_file: None,
            timeout_secs: 900,
        }
    }
}

/// Segmentation and delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    /// Ceiling for a single attachment, in bytes.
    pub size_limit_bytes: u64,
    /// Timeout for each ffmpeg/ffprobe call, in seconds.
    pub cut_timeout_secs: u64,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            size_limit_bytes: DEFAULT_SIZE_LIMIT_BYTES,
            cut_timeout_secs: 120,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Settings::default())
        }
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay values that came from the environment or the command line.
    pub fn with_overrides(mut self, token: Option<String>, cookies_file: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.telegram.token = Some(token);
        }
        if let Some(cookies) = cookies_file.filter(|c| !c.trim().is_empty()) {
            self.fetcher.cookies_file = Some(cookies);
        }
        self
    }

    /// Check that the settings can run a bot.
    pub fn validate(&self) -> Result<()> {
        if self.token().is_none() {
            return Err(RelayError::Config(
                "Bot token not set. Set it with: export TELEGRAM_TOKEN='123456:ABC...'".to_string(),
            ));
        }
        if self.delivery.size_limit_bytes == 0 {
            return Err(RelayError::Config(
                "delivery.size_limit_bytes must be greater than zero".to_string(),
            ));
        }
        if self.telegram.max_concurrent_requests == 0 {
            return Err(RelayError::Config(
                "telegram.max_concurrent_requests must be greater than zero".to_string(),
            ));
        }
        if let Some(cookies) = self.cookies_file() {
            if !cookies.exists() {
                return Err(RelayError::Config(format!(
                    "Cookie file {} does not exist",
                    cookies.display()
                )));
            }
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubecast")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Bot token, if configured and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.telegram
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded cookie file path, if any.
    pub fn cookies_file(&self) -> Option<PathBuf> {
        self.fetcher.cookies_file.as_deref().map(Self::expand_path)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.timeout_secs)
    }

    pub fn cut_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.cut_timeout_secs)
    }
}
