//! Extraction of video and playlist identifiers from freeform user input.

use regex::Regex;

/// Pull a video identifier out of `input`.
///
/// Accepts a bare 11-character identifier or any of the usual URL shapes:
/// `watch?v=`, `youtu.be/`, and `embed/`. Trailing query parameters are
/// dropped. Returns `None` when nothing identifier-like is present.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare identifier, no URL punctuation.
    let bare = Regex::new(r"^[A-Za-z0-9_-]{11}$").ok()?;
    if bare.is_match(input) {
        return Some(input.to_string());
    }

    // youtube.com/watch?v=<id>, any host prefix, later parameters dropped.
    let watch = Regex::new(r"youtube\.com/watch\?v=([^&\s]+)").ok()?;
    if let Some(caps) = watch.captures(input) {
        return Some(caps[1].to_string());
    }

    // youtu.be/<id>
    let short = Regex::new(r"youtu\.be/([^?\s]+)").ok()?;
    if let Some(caps) = short.captures(input) {
        return Some(caps[1].to_string());
    }

    // youtube.com/embed/<id>
    let embed = Regex::new(r"youtube\.com/embed/([^?\s]+)").ok()?;
    if let Some(caps) = embed.captures(input) {
        return Some(caps[1].to_string());
    }

    None
}

/// Pull a playlist identifier out of a `list=` query parameter.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();
    let re = Regex::new(r"(?:^|[?&])list=([A-Za-z0-9_-]+)").ok()?;
    re.captures(input).map(|caps| caps[1].to_string())
}
