//! Error types for Tubecast.

use thiserror::Error;

/// Library-level error type for Tubecast operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Audio file not found after download: {0}")]
    AssetNotFound(String),

    #[error("Failed to cut segment {index}: {reason}")]
    SegmentCutFailed { index: usize, reason: String },

    #[error("Segment {index} is {size} bytes, over the {limit} byte limit")]
    OversizedSegment { index: usize, size: u64, limit: u64 },

    #[error("{tool} did not finish within {seconds} seconds")]
    ExternalToolTimeout { tool: String, seconds: u64 },

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// Short machine-readable name of the error kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "config",
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::AssetNotFound(_) => "asset_not_found",
            RelayError::SegmentCutFailed { .. } => "segment_cut_failed",
            RelayError::OversizedSegment { .. } => "oversized_segment",
            RelayError::ExternalToolTimeout { .. } => "external_tool_timeout",
            RelayError::ToolNotFound(_) => "tool_not_found",
            RelayError::ToolFailed { .. } => "tool_failed",
            RelayError::Telegram(_) => "telegram",
            RelayError::Io(_) => "io",
            RelayError::Json(_) => "json",
            RelayError::TomlParse(_) => "toml",
            RelayError::Http(_) => "http",
        }
    }

    /// Text that is safe to show in the chat.
    ///
    /// Raw tool output and paths stay in the log; the chat only gets a
    /// generic description of what went wrong.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::InvalidInput(_) => {
                "That link could not be processed. Please send a valid YouTube link.".to_string()
            }
            RelayError::AssetNotFound(_) => {
                "The download finished but the audio file could not be found.".to_string()
            }
            RelayError::SegmentCutFailed { index, .. } => {
                format!("Part {} could not be cut from the audio and was skipped.", index)
            }
            RelayError::OversizedSegment { index, .. } => {
                format!("Part {} is too large to send and was skipped.", index)
            }
            RelayError::ExternalToolTimeout { .. } => {
                "Processing took too long and was stopped. Please try again later.".to_string()
            }
            RelayError::ToolFailed { .. } => {
                "The video could not be downloaded. It may be private, removed or region-locked."
                    .to_string()
            }
            _ => "Something went wrong while processing your request.".to_string(),
        }
    }
}

/// Result type alias for Tubecast operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_diagnostics() {
        let err = RelayError::ToolFailed {
            tool: "yt-dlp".to_string(),
            detail: "ERROR: /home/bot/secret/cookies.txt rejected".to_string(),
        };

        let message = err.user_message();
        assert!(!message.contains("cookies.txt"));
        assert!(!message.contains("yt-dlp"));
        assert!(err.to_string().contains("cookies.txt"));
    }

    #[test]
    fn test_segment_messages_name_the_part() {
        let err = RelayError::OversizedSegment {
            index: 2,
            size: 60,
            limit: 50,
        };
        assert!(err.user_message().contains("Part 2"));
        assert_eq!(err.kind(), "oversized_segment");
    }
}
