//! Video ID extraction from YouTube URLs.

use regex::Regex;
use std::sync::OnceLock;

pub mod youtube;

use youtube::UrlPattern;

/// Length of every YouTube video ID
pub const VIDEO_ID_LEN: usize = 11;

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("valid video id regex"))
}

/// Whether `input` is already a bare 11-character video ID
pub fn is_video_id(input: &str) -> bool {
    video_id_regex().is_match(input)
}

/// Extract the video ID from a YouTube URL, or return the input if it already is one.
///
/// URL patterns are tried in [`UrlPattern::ALL`] order and the first pattern that
/// matches wins, regardless of where in the string its match sits.
pub fn extract_video_id(url_or_id: &str) -> Option<String> {
    if url_or_id.is_empty() {
        return None;
    }

    if is_video_id(url_or_id) {
        return Some(url_or_id.to_string());
    }

    UrlPattern::ALL.iter().find_map(|pattern| {
        pattern.capture(url_or_id).map(|id| {
            tracing::debug!(?pattern, video_id = id, "matched YouTube URL pattern");
            id.to_string()
        })
    })
}

/// Resolve user input to a video ID for the CLI.
///
/// Unlike [`extract_video_id`], input that is neither an ID nor a URL is passed through
/// untouched so the caption provider can report on it.
pub fn resolve_video_id(input: &str) -> crate::Result<String> {
    let input = input.trim();
    if let Some(id) = extract_video_id(input) {
        return Ok(id);
    }

    if crate::utils::is_url(input) && !youtube::supports_url(input) {
        anyhow::bail!("Not a YouTube URL: {}", input);
    }

    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "dQw4w9WgXcQ";

    #[test]
    fn test_extract_from_supported_urls() {
        let inputs = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "dQw4w9WgXcQ",
        ];

        for input in inputs {
            assert_eq!(extract_video_id(input).as_deref(), Some(ID), "input: {}", input);
        }
    }

    #[test]
    fn test_extract_not_found() {
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("https://vimeo.com/123456789"), None);
        assert_eq!(extract_video_id("https://youtu.be/short"), None);
        assert_eq!(extract_video_id("dQw4w9WgXc"), None);
    }

    #[test]
    fn test_bare_id_returned_unchanged() {
        assert_eq!(extract_video_id("a-b_c-D_e-F").as_deref(), Some("a-b_c-D_e-F"));
    }

    #[test]
    fn test_id_is_case_sensitive() {
        assert_eq!(
            extract_video_id("https://WWW.YOUTUBE.COM/watch?v=AbCdEfGhIjK").as_deref(),
            Some("AbCdEfGhIjK")
        );
    }

    #[test]
    fn test_pattern_priority_beats_position() {
        // the short-link appears first in the string, but the watch pattern has priority
        let input = "https://youtu.be/AAAAAAAAAAA https://www.youtube.com/watch?v=BBBBBBBBBBB";
        assert_eq!(extract_video_id(input).as_deref(), Some("BBBBBBBBBBB"));
    }

    #[test]
    fn test_extracted_ids_have_canonical_shape() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ?si=tracking").unwrap();
        assert_eq!(id.len(), VIDEO_ID_LEN);
        assert!(is_video_id(&id));
    }

    #[test]
    fn test_resolve_video_id() {
        assert_eq!(resolve_video_id(" https://youtu.be/dQw4w9WgXcQ ").unwrap(), ID);
        assert_eq!(resolve_video_id("odd-input").unwrap(), "odd-input");
        assert!(resolve_video_id("https://vimeo.com/123456789").is_err());
    }
}
