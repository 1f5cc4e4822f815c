//! YouTube Transcript MCP - extract video IDs and download caption transcripts
//!
//! This library exposes a Model Context Protocol server over newline-delimited JSON-RPC
//! on stdio, plus the building blocks behind it: video ID extraction, a caption provider
//! that talks to YouTube, and formatters for text, JSON, SRT and WebVTT output.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod mcp;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::extract_video_id;
pub use output::format_transcript;
pub use transcribe::{CaptionProvider, CaptionSnippet, Transcript, YoutubeCaptionProvider};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures reported by a caption provider
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("The video {0} is no longer available")]
    VideoUnavailable(String),

    #[error("You provided an invalid video id. Make sure you are using the video id and NOT the url! (received '{0}')")]
    InvalidVideoId(String),

    #[error("Subtitles are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error(
        "No transcripts were found for video {video_id} in any of the requested languages {requested:?}. Available: {available}"
    )]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: String,
    },

    #[error("The requested language is not translatable for video {0}")]
    NotTranslatable(String),

    #[error("The requested translation language '{language}' is not available for video {video_id}")]
    TranslationLanguageNotAvailable { video_id: String, language: String },

    #[error("No translatable transcripts found for video {0}")]
    NoTranslatableTranscript(String),

    #[error("The video {0} is age restricted and requires authentication")]
    AgeRestricted(String),

    #[error("The video {video_id} is unplayable: {reason}{}", format_sub_reasons(.sub_reasons))]
    VideoUnplayable {
        video_id: String,
        reason: String,
        sub_reasons: Vec<String>,
    },

    #[error("YouTube is blocking requests for video {0} from your IP (bot check)")]
    RequestBlocked(String),

    #[error("YouTube is blocking requests for video {0} from your IP (reCAPTCHA)")]
    IpBlocked(String),

    #[error("YouTube is rate limiting requests for video {0}")]
    TooManyRequests(String),

    #[error("Failed to automatically give consent to saving cookies for video {0}")]
    FailedToCreateConsentCookie(String),

    #[error("The captions of video {0} require a PO token, which is not supported")]
    PoTokenRequired(String),

    #[error("The data required to fetch the transcript of video {0} is not parsable")]
    YoutubeDataUnparsable(String),

    #[error("Request to YouTube failed for video {video_id}: {source}")]
    Http {
        video_id: String,
        #[source]
        source: reqwest::Error,
    },
}

fn format_sub_reasons(sub_reasons: &[String]) -> String {
    if sub_reasons.is_empty() {
        String::new()
    } else {
        format!(" ({})", sub_reasons.join("; "))
    }
}

/// A format selector outside json, text, srt and vtt
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported format type: {0}")]
pub struct UnsupportedFormat(pub String);
