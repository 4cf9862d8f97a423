//! Command-line interface for voxtask.
//!
//! Provides commands for running the HTTP API server, parsing transcripts,
//! transcribing audio files, and inspecting the resolved configuration.

use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{DeepgramClient, GeminiClient};
use crate::capture::AudioClip;
use crate::config;
use crate::server::{self, AppState};
use crate::store::SqliteTaskStore;
use crate::voice::{Transcriber, VoiceParser, VoicePipeline};

/// voxtask - voice-driven task tracker
#[derive(Parser, Debug)]
#[command(name = "voxtask")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (host:port; defaults to the configured address)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Parse a transcript into a task draft and print it as JSON
    Parse {
        /// Transcript text (reads from stdin if not provided)
        transcript: Option<String>,
    },

    /// Transcribe an audio file and parse the result into a task draft
    Transcribe {
        /// Audio file (webm, mp4, m4a, mpeg, mp3, wav, ogg)
        file: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { address } => serve(address).await,
            Commands::Parse { transcript } => parse_transcript(transcript).await,
            Commands::Transcribe { file } => transcribe_file(&file).await,
            Commands::Config => show_config(),
        }
    }
}

/// Start the HTTP API server
async fn serve(address: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let addr_str = address.unwrap_or_else(|| cfg.server.bind_addr());
    let addr: SocketAddr = addr_str
        .parse()
        .with_context(|| format!("Invalid bind address: {addr_str}"))?;

    if let Some(parent) = cfg.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }
    let store = SqliteTaskStore::open(&cfg.database)?;

    let state = AppState {
        store: Arc::new(store),
        pipeline: Arc::new(build_pipeline()?),
    };

    server::serve(addr, state).await
}

/// Parse a transcript from the argument or stdin
async fn parse_transcript(arg: Option<String>) -> Result<()> {
    let transcript = match arg {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read transcript from stdin")?;
            buffer
        }
    };

    if transcript.trim().is_empty() {
        anyhow::bail!("No transcript provided. Pass it as an argument or pipe to stdin");
    }

    let parser = build_parser()?;
    let draft = parser.parse(&transcript).await?;

    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

/// Transcribe an audio file, then parse the transcript
async fn transcribe_file(path: &Path) -> Result<()> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read audio file: {}", path.display()))?;
    let mime_type = mime_for_extension(path)?;

    let clip = AudioClip::from_bytes(data, mime_type)?;
    if !clip.transcribable() {
        anyhow::bail!("{} audio can be captured but not transcribed", mime_type);
    }
    eprintln!(
        "Clip {} ({} bytes, {})",
        clip.id,
        clip.data.len(),
        clip.mime_type
    );

    let pipeline = build_pipeline()?;
    let (transcript, draft) = pipeline.process(&clip.data, &clip.mime_type).await?;

    eprintln!("Transcript: {}", transcript.text);
    if let Some(confidence) = transcript.confidence {
        eprintln!("Confidence: {:.2}", confidence);
    }
    if let Some(secs) = transcript.duration_secs {
        eprintln!("Duration:   {:.1}s", secs);
    }

    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("voxtask configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Server:");
    println!("  Bind address: {}", cfg.server.bind_addr());
    println!();
    println!("Voice pipeline:");
    println!("  Model chain:      {}", cfg.voice.model_chain.join(" -> "));
    println!("  Retry attempts:   {}", cfg.voice.retry.max_attempts);
    println!("  Retry base delay: {}ms", cfg.voice.retry.base_delay_ms);
    println!("  Provider timeout: {}s", cfg.voice.provider_timeout_secs);

    Ok(())
}

/// Build the parsing half of the pipeline from config + env
fn build_parser() -> Result<VoiceParser> {
    let cfg = config::config()?;
    let model = Arc::new(GeminiClient::from_env()?);

    Ok(VoiceParser::new(model)
        .with_chain(cfg.voice.model_chain.clone())
        .with_call_timeout(Duration::from_secs(cfg.voice.provider_timeout_secs)))
}

/// Build the transcribing half of the pipeline from config + env
fn build_transcriber() -> Result<Transcriber> {
    let cfg = config::config()?;
    let speech = Arc::new(DeepgramClient::from_env()?);

    Ok(Transcriber::new(speech)
        .with_policy(cfg.voice.retry.clone())
        .with_call_timeout(Duration::from_secs(cfg.voice.provider_timeout_secs)))
}

fn build_pipeline() -> Result<VoicePipeline> {
    Ok(VoicePipeline::new(build_transcriber()?, build_parser()?))
}

/// Map a file extension to the MIME type the providers expect
fn mime_for_extension(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mime = match ext.as_str() {
        "webm" => "audio/webm",
        "mp4" => "audio/mp4",
        "m4a" => "audio/x-m4a",
        "mpeg" | "mpga" => "audio/mpeg",
        "mp3" => "audio/mp3",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => anyhow::bail!("Unsupported audio file type: {}", path.display()),
    };
    Ok(mime)
}
