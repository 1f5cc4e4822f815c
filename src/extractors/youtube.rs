use regex::Regex;
use std::sync::OnceLock;

/// YouTube URL shapes that carry a video ID, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPattern {
    /// `youtube.com/watch?v=<id>`
    Watch,
    /// `youtu.be/<id>`
    ShortLink,
    /// `youtube.com/embed/<id>`
    Embed,
    /// `youtube.com/watch?...&v=<id>`, e.g. playlist links
    WatchWithParams,
}

impl UrlPattern {
    /// All patterns, in the order they are tried
    pub const ALL: [UrlPattern; 4] = [
        UrlPattern::Watch,
        UrlPattern::ShortLink,
        UrlPattern::Embed,
        UrlPattern::WatchWithParams,
    ];

    // Scheme and host match case-insensitively, the ID group never does.
    fn source(&self) -> &'static str {
        match self {
            UrlPattern::Watch => {
                r"(?i:https?://)?(?i:www\.)?(?i:youtube\.com)/watch\?v=([a-zA-Z0-9_-]{11})"
            }
            UrlPattern::ShortLink => r"(?i:https?://)?(?i:youtu\.be)/([a-zA-Z0-9_-]{11})",
            UrlPattern::Embed => {
                r"(?i:https?://)?(?i:www\.)?(?i:youtube\.com)/embed/([a-zA-Z0-9_-]{11})"
            }
            UrlPattern::WatchWithParams => {
                r"(?i:https?://)?(?i:www\.)?(?i:youtube\.com)/watch\?.*v=([a-zA-Z0-9_-]{11})"
            }
        }
    }

    fn regex(&self) -> &'static Regex {
        static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
        let compiled = COMPILED.get_or_init(|| {
            UrlPattern::ALL
                .iter()
                .map(|pattern| Regex::new(pattern.source()).expect("valid YouTube URL regex"))
                .collect()
        });
        &compiled[*self as usize]
    }

    /// The video ID this pattern finds anywhere in `input`, if any
    pub fn capture<'a>(&self, input: &'a str) -> Option<&'a str> {
        self.regex()
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Check if a URL points at YouTube at all
pub fn supports_url(url: &str) -> bool {
    let url_lower = url.to_lowercase();
    url_lower.contains("youtube.com/watch")
        || url_lower.contains("youtu.be/")
        || url_lower.contains("youtube.com/embed/")
}
