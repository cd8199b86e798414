//! Filesystem-safe names derived from media titles.

mod translit;

pub use translit::transliterate;

use regex::Regex;
use std::sync::OnceLock;

/// Token used when a title has no letters or digits at all.
pub const FALLBACK_NAME: &str = "audio";

/// Longest name, in characters, that `normalize` produces.
pub const MAX_NAME_CHARS: usize = 100;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}\s_-]").expect("Invalid regex"))
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("Invalid regex"))
}

/// Maps an arbitrary title to a transliterated, filesystem-safe token.
///
/// Output contains only letters, digits and `_`. Combining marks, joiners and
/// connector punctuation are dropped. The mapping is total and idempotent.
pub fn normalize(raw_title: &str) -> String {
    let latin = transliterate(raw_title);
    let stripped = disallowed_chars().replace_all(&latin, "");
    let collapsed = separator_runs().replace_all(stripped.trim(), "_");

    let name: String = collapsed.chars().take(MAX_NAME_CHARS).collect();

    if name.chars().any(char::is_alphanumeric) {
        name
    } else {
        FALLBACK_NAME.to_string()
    }
}
