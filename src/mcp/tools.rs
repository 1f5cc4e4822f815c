//! MCP tool implementations: maps tool calls to video ID extraction and transcript fetches.

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

use super::types::{ToolDefinition, ToolsCallResult};
use crate::cli::OutputFormat;
use crate::extractors::extract_video_id;
use crate::output::format_transcript;
use crate::transcribe::CaptionProvider;

/// Tools exposed through tools/call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    ExtractVideoId,
    GetVideoTranscript,
}

impl ToolName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "extract_video_id" => Some(ToolName::ExtractVideoId),
            "get_video_transcript" => Some(ToolName::GetVideoTranscript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ExtractVideoId => "extract_video_id",
            ToolName::GetVideoTranscript => "get_video_transcript",
        }
    }
}

/// Faults a tool did not anticipate; reported as "Unexpected error: ..."
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{0}")]
    Format(anyhow::Error),

    #[error("{0}")]
    Panicked(String),
}

#[derive(Debug, Default, Deserialize)]
struct ExtractVideoIdArgs {
    #[serde(default)]
    url_or_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GetVideoTranscriptArgs {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    languages: Option<Vec<String>>,
    #[serde(default)]
    format: Option<String>,
}

/// Return the list of all available tools with their JSON schemas.
pub fn list_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolName::ExtractVideoId.as_str().to_string(),
            description: "Extract YouTube video ID from a URL or return the ID if already provided"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url_or_id": {
                        "type": "string",
                        "description": "YouTube URL or video ID"
                    }
                },
                "required": ["url_or_id"]
            }),
        },
        ToolDefinition {
            name: ToolName::GetVideoTranscript.as_str().to_string(),
            description: "Download transcript for a YouTube video".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "video_id": {
                        "type": "string",
                        "description": "YouTube video ID"
                    },
                    "languages": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of preferred language codes (e.g., ['en', 'zh-TW', 'es'])",
                        "default": ["en"]
                    },
                    "format": {
                        "type": "string",
                        "enum": ["json", "text", "srt", "vtt"],
                        "description": "Output format",
                        "default": "text"
                    }
                },
                "required": ["video_id"]
            }),
        },
    ]
}

/// Dispatch a tool call to the appropriate handler.
///
/// Never fails: domain errors come back as `isError` results, and anything the handlers
/// did not anticipate (bad argument types, panics) is turned into one here.
pub async fn call_tool(provider: &dyn CaptionProvider, name: &str, arguments: &Value) -> ToolsCallResult {
    let outcome = AssertUnwindSafe(dispatch(provider, name, arguments))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ToolError::Panicked(panic_message(panic.as_ref()))));

    match outcome {
        Ok(result) => {
            if result.is_error {
                warn!(tool = name, message = %result.first_text(), "tool returned an error");
            }
            result
        }
        Err(e) => {
            error!(tool = name, error = %e, "unexpected tool failure");
            ToolsCallResult::error(format!("Unexpected error: {}", e))
        }
    }
}

async fn dispatch(
    provider: &dyn CaptionProvider,
    name: &str,
    arguments: &Value,
) -> Result<ToolsCallResult, ToolError> {
    match ToolName::parse(name) {
        Some(ToolName::ExtractVideoId) => handle_extract_video_id(arguments),
        Some(ToolName::GetVideoTranscript) => handle_get_video_transcript(provider, arguments).await,
        None => Ok(ToolsCallResult::error(format!("Unknown tool: {}", name))),
    }
}

/// Missing or null arguments count as an empty object
fn parse_args<T: DeserializeOwned + Default>(arguments: &Value) -> Result<T, ToolError> {
    if arguments.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(arguments)?)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}

fn handle_extract_video_id(arguments: &Value) -> Result<ToolsCallResult, ToolError> {
    let args: ExtractVideoIdArgs = parse_args(arguments)?;
    let url_or_id = args.url_or_id.unwrap_or_default();

    let result = match extract_video_id(&url_or_id) {
        Some(video_id) => ToolsCallResult::text(format!("Video ID: {}", video_id)),
        None => ToolsCallResult::error(format!(
            "Error: Could not extract valid video ID from '{}'",
            url_or_id
        )),
    };
    Ok(result)
}

async fn handle_get_video_transcript(
    provider: &dyn CaptionProvider,
    arguments: &Value,
) -> Result<ToolsCallResult, ToolError> {
    let args: GetVideoTranscriptArgs = parse_args(arguments)?;

    let video_id = args.video_id.unwrap_or_default();
    if video_id.is_empty() {
        return Ok(ToolsCallResult::error("Error: video_id is required"));
    }

    let languages = args.languages.unwrap_or_else(|| vec!["en".to_string()]);

    // checked before the fetch so a bad selector costs no network round trip
    let format: OutputFormat = match args.format.as_deref().unwrap_or("text").parse() {
        Ok(format) => format,
        Err(e) => return Ok(ToolsCallResult::error(format!("Error getting transcript: {}", e))),
    };

    debug!(video_id = %video_id, ?languages, %format, "fetching transcript");

    let transcript = match provider.fetch(&video_id, &languages).await {
        Ok(transcript) => transcript,
        Err(e) => {
            return Ok(ToolsCallResult::error(format!(
                "Error getting transcript: Could not get transcript for video {}: {}",
                video_id, e
            )))
        }
    };

    let formatted = format_transcript(&transcript, format).map_err(ToolError::Format)?;
    Ok(ToolsCallResult::text(formatted))
}
