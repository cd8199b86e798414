//! YouTube link recognition.

use super::LinkSource;

/// Substrings that mark a YouTube link. `youtube.com` also covers the
/// `www.`, `m.` and `music.` hosts.
const HOST_MARKERS: &[&str] = &["youtube.com", "youtu.be"];

/// YouTube link source.
pub struct YoutubeSource;

impl YoutubeSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YoutubeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkSource for YoutubeSource {
    fn name(&self) -> &'static str {
        "YouTube"
    }

    fn can_handle(&self, token: &str) -> bool {
        let lower = token.to_ascii_lowercase();
        HOST_MARKERS.iter().any(|marker| lower.contains(marker))
    }
}
