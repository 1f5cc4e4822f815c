use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use youtube_transcript_mcp::cli::{Cli, Commands, OutputFormat};
use youtube_transcript_mcp::config::Config;
use youtube_transcript_mcp::extractors::{extract_video_id, resolve_video_id};
use youtube_transcript_mcp::mcp::McpServer;
use youtube_transcript_mcp::output::{self, format_video_info};
use youtube_transcript_mcp::transcribe::{CaptionProvider, Transcript, YoutubeCaptionProvider};
use youtube_transcript_mcp::utils::{format_duration, validate_language_code};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    // a fresh config file must not require an existing one
    if let Some(Commands::Config { init: true, .. }) = cli.command {
        return init_config(cli.config.as_deref());
    }

    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let provider = YoutubeCaptionProvider::new(&config.youtube)?;
            let server = McpServer::new(provider);

            tracing::info!("MCP server ready, waiting for JSON-RPC requests on stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server.run(stdin, tokio::io::stdout()).await?;
        }
        Commands::VideoId { input } => match extract_video_id(&input) {
            Some(video_id) => println!("{}", video_id),
            None => anyhow::bail!("Could not extract valid video ID from '{}'", input),
        },
        Commands::Transcript {
            video,
            languages,
            format,
            output,
        } => {
            let provider = YoutubeCaptionProvider::new(&config.youtube)?;
            let video_id = resolve_video_id(&video)?;
            let languages = if languages.is_empty() {
                config.app.default_languages.clone()
            } else {
                languages
            };
            for code in languages.iter().filter(|code| !validate_language_code(code)) {
                tracing::warn!("'{}' does not look like a language code", code);
            }
            let format = resolve_format(format, &config)?;

            tracing::info!("Fetching transcript for video: {}", video_id);
            let transcript = provider.fetch(&video_id, &languages).await?;
            emit(&transcript, format, output.as_deref())?;
        }
        Commands::Languages { video } => {
            let provider = YoutubeCaptionProvider::new(&config.youtube)?;
            let video_id = resolve_video_id(&video)?;

            let list = provider.list(&video_id).await?;
            println!("{}", format_video_info(&list.video_info()));
        }
        Commands::Translate {
            video,
            to,
            from,
            format,
            output,
        } => {
            let provider = YoutubeCaptionProvider::new(&config.youtube)?;
            let video_id = resolve_video_id(&video)?;
            let format = resolve_format(format, &config)?;

            let transcript = provider.translate(&video_id, &to, from).await?;
            emit(&transcript, format, output.as_deref())?;
        }
        Commands::Config { .. } => config.display(),
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "youtube_transcript_mcp=debug"
    } else if cli.quiet {
        "youtube_transcript_mcp=warn"
    } else {
        "youtube_transcript_mcp=info"
    };

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()));

    // stdout carries the protocol, so logs always go to stderr
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn init_config(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::user_config_path()?,
    };
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }

    Config::default().save(&path)?;
    println!("Configuration written to: {}", path.display());
    Ok(())
}

fn resolve_format(format: Option<OutputFormat>, config: &Config) -> Result<OutputFormat> {
    match format {
        Some(format) => Ok(format),
        None => Ok(config.default_output_format()?),
    }
}

fn emit(transcript: &Transcript, format: OutputFormat, destination: Option<&Path>) -> Result<()> {
    tracing::info!(
        "Transcript in {} ({}), {} snippets spanning {}",
        transcript.language,
        transcript.language_code,
        transcript.snippets.len(),
        format_duration(transcript.duration())
    );

    match destination {
        Some(path) => {
            let path = output::resolve_output_path(path, transcript, format);
            output::save_to_file(transcript, &path, format)?;
            println!("Transcript saved to: {}", path.display());
        }
        None => output::print_to_console(transcript, format)?,
    }
    Ok(())
}
