use anyhow::Result;
use serde::Serialize;

use crate::transcribe::{CaptionSnippet, Transcript, VideoInfo};

/// JSON document shape of a formatted transcript
#[derive(Serialize)]
struct JsonTranscript<'a> {
    video_id: &'a str,
    language: &'a str,
    language_code: &'a str,
    is_generated: bool,
    transcript: &'a [CaptionSnippet],
}

/// Format as pretty-printed JSON, keeping non-ASCII text as is
pub fn format_as_json(transcript: &Transcript) -> Result<String> {
    let document = JsonTranscript {
        video_id: &transcript.video_id,
        language: &transcript.language,
        language_code: &transcript.language_code,
        is_generated: transcript.is_generated,
        transcript: &transcript.snippets,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Format as plain text, one `[12.34s] text` line per snippet
pub fn format_as_text(transcript: &Transcript) -> String {
    transcript
        .snippets
        .iter()
        .map(|snippet| format!("[{:.2}s] {}", snippet.start, snippet.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format as SRT subtitles
pub fn format_as_srt(transcript: &Transcript) -> String {
    let mut lines = Vec::with_capacity(transcript.snippets.len() * 4);

    for (i, snippet) in transcript.snippets.iter().enumerate() {
        lines.push((i + 1).to_string());
        lines.push(format!(
            "{} --> {}",
            seconds_to_srt_time(snippet.start),
            seconds_to_srt_time(snippet.end())
        ));
        lines.push(snippet.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Format as WebVTT subtitles
pub fn format_as_vtt(transcript: &Transcript) -> String {
    let mut lines = Vec::with_capacity(2 + transcript.snippets.len() * 3);
    lines.push("WEBVTT".to_string());
    lines.push(String::new());

    for snippet in &transcript.snippets {
        lines.push(format!(
            "{} --> {}",
            seconds_to_vtt_time(snippet.start),
            seconds_to_vtt_time(snippet.end())
        ));
        lines.push(snippet.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Split seconds into truncated hours, minutes, seconds and milliseconds
fn split_seconds(seconds: f64) -> (u64, u64, u64, u64) {
    let seconds = seconds.max(0.0);
    let whole = seconds.trunc() as u64;
    let millis = (seconds.fract() * 1000.0) as u64;

    (whole / 3600, (whole % 3600) / 60, whole % 60, millis)
}

/// Convert seconds to SRT time format (HH:MM:SS,mmm)
pub fn seconds_to_srt_time(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_seconds(seconds);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Convert seconds to WebVTT time format (HH:MM:SS.mmm)
pub fn seconds_to_vtt_time(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_seconds(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

/// Human-readable listing of the caption tracks of a video
pub fn format_video_info(info: &VideoInfo) -> String {
    let mut lines = vec![format!(
        "Video {}: {} transcript(s)",
        info.video_id, info.total_transcripts
    )];

    for track in &info.available_languages {
        let kind = if track.is_generated { "generated" } else { "manual" };
        let translatable = if track.is_translatable { ", translatable" } else { "" };
        lines.push(format!(
            "  {:<8} {} ({}{})",
            track.language_code, track.language, kind, translatable
        ));
    }

    lines.join("\n")
}
