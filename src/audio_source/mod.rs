//! Link recognition for inbound chat messages.
//!
//! Provides a trait-based interface for the video hosts the relay accepts.

mod youtube;

pub use youtube::YoutubeSource;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// A single relay request, created per inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    /// Link handed to the fetcher.
    pub source_link: String,
}

/// Trait for video hosts the relay knows how to fetch from.
pub trait LinkSource: Send + Sync {
    /// Human-readable host name.
    fn name(&self) -> &'static str;

    /// Check if this source recognizes the given token as one of its links.
    fn can_handle(&self, token: &str) -> bool;
}

/// All sources the relay accepts links from.
pub fn sources() -> Vec<Box<dyn LinkSource>> {
    vec![Box::new(YoutubeSource::new())]
}

/// Extracts a request from a message text.
///
/// The first whitespace-separated token recognized by any source is used.
/// A token without a scheme gets `https://` prepended. Returns `None` when
/// the text holds no supported link.
pub fn parse_request(text: &str) -> Option<MediaRequest> {
    let sources = sources();

    text.split_whitespace().find_map(|token| {
        let source = sources.iter().find(|s| s.can_handle(token))?;
        let source_link = normalize_link(token)?;
        debug!("Matched {} link: {}", source.name(), source_link);
        Some(MediaRequest { source_link })
    })
}

fn normalize_link(token: &str) -> Option<String> {
    let token = token.trim_matches(|c: char| matches!(c, '<' | '>' | '(' | ')' | '"' | '\''));

    let parsed = if token.contains("://") {
        Url::parse(token).ok()?
    } else {
        Url::parse(&format!("https://{}", token)).ok()?
    };

    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}
