use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use crate::UnsupportedFormat;

#[derive(Parser)]
#[command(
    name = "youtube-transcript-mcp",
    about = "YouTube Transcript MCP - Download YouTube captions over MCP or from the command line",
    version,
    long_about = "A Model Context Protocol server that extracts YouTube video IDs and downloads caption transcripts as text, JSON, SRT or WebVTT. Runs the stdio server when no subcommand is given."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE", env = "YOUTUBE_TRANSCRIPT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server over stdin/stdout (default)
    Serve,

    /// Extract the video ID from a YouTube URL
    VideoId {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        input: String,
    },

    /// Download the transcript of a video
    Transcript {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        video: String,

        /// Preferred language codes, in order of preference (defaults to the configured languages)
        #[arg(short, long, value_name = "LANG", value_delimiter = ',')]
        languages: Vec<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file, or a directory to save `<VIDEO_ID>_<LANG>.<EXT>` into (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the caption tracks available for a video
    Languages {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        video: String,
    },

    /// Translate a transcript into another language
    Translate {
        /// YouTube URL or video ID
        #[arg(value_name = "URL_OR_ID")]
        video: String,

        /// Target language code
        #[arg(long, value_name = "LANG")]
        to: String,

        /// Source language code (first translatable track if not specified)
        #[arg(long, value_name = "LANG")]
        from: Option<String>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file, or a directory to save `<VIDEO_ID>_<LANG>.<EXT>` into (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or initialize the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text with timestamps
    Text,
    /// JSON with transcript metadata
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }

    /// File extension used when saving this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" => Ok(OutputFormat::Vtt),
            other => Err(UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
