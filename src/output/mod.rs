use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::transcribe::Transcript;
use crate::utils::sanitize_filename;

pub mod formatters;

pub use formatters::*;

/// Render a transcript in the given format
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(transcript),
        OutputFormat::Json => format_as_json(transcript)?,
        OutputFormat::Srt => format_as_srt(transcript),
        OutputFormat::Vtt => format_as_vtt(transcript),
    };
    Ok(content)
}

/// Render a transcript with a format selector such as `"srt"`.
///
/// Unknown selectors fail with [`crate::UnsupportedFormat`].
pub fn format_transcript_as(transcript: &Transcript, format_type: &str) -> Result<String> {
    let format: OutputFormat = format_type.parse()?;
    format_transcript(transcript, format)
}

/// File name for a saved transcript, e.g. `dQw4w9WgXcQ_en.srt`
pub fn default_file_name(transcript: &Transcript, format: OutputFormat) -> String {
    let stem = sanitize_filename(&format!("{}_{}", transcript.video_id, transcript.language_code));
    format!("{}.{}", stem, format.extension())
}

/// `path` itself, or a default-named file inside it when `path` is a directory
pub fn resolve_output_path(path: &Path, transcript: &Transcript, format: OutputFormat) -> PathBuf {
    if path.is_dir() {
        path.join(default_file_name(transcript, format))
    } else {
        path.to_path_buf()
    }
}

/// Save a formatted transcript to file
pub fn save_to_file(transcript: &Transcript, path: &Path, format: OutputFormat) -> Result<()> {
    let content = format_transcript(transcript, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print a formatted transcript to console
pub fn print_to_console(transcript: &Transcript, format: OutputFormat) -> Result<()> {
    let content = format_transcript(transcript, format)?;
    println!("{}", content);
    Ok(())
}
