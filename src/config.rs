//! Configuration for voxtask.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (VOXTASK_HOME, VOXTASK_DB, VOXTASK_HOST, VOXTASK_PORT)
//! 2. Config file (.voxtask/config.yaml)
//! 3. Defaults (~/.voxtask)
//!
//! Config file discovery:
//! - Searches current directory and parents for .voxtask/config.yaml
//! - Paths in config file are relative to the config file's parent directory
//!
//! Provider API keys are environment-only (DEEPGRAM_API_KEY, GEMINI_API_KEY);
//! they never appear in the config file.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::voice::parser::default_chain;
use crate::voice::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub voice: Option<VoiceConfig>,
    #[serde(default)]
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Task database file (relative to config file)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Fallback chain of model identifiers, tried in order
    pub model_chain: Option<Vec<String>>,
    /// Transcription retry policy
    pub retry: Option<RetryPolicy>,
    /// Per-call provider timeout in seconds
    pub provider_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Resolved configuration with absolute paths and all defaults applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to voxtask home (state directory)
    pub home: PathBuf,
    /// Absolute path to the task database
    pub database: PathBuf,
    /// Voice pipeline settings
    pub voice: VoiceSettings,
    /// HTTP server settings
    pub server: ServerSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub model_chain: Vec<String>,
    pub retry: RetryPolicy,
    pub provider_timeout_secs: u64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            model_chain: default_chain(),
            retry: RetryPolicy::default(),
            provider_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    /// Bind address in host:port form
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".voxtask").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".voxtask");

    let config_file = find_config_file();

    let file = match &config_file {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    // Base for relative paths is the parent of .voxtask/
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let home = if let Ok(env_home) = std::env::var("VOXTASK_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = file.as_ref().and_then(|f| f.paths.home.as_ref()) {
        resolve_path(&base_dir, home_path)
    } else {
        default_home
    };

    let database = if let Ok(env_db) = std::env::var("VOXTASK_DB") {
        PathBuf::from(env_db)
    } else if let Some(db_path) = file.as_ref().and_then(|f| f.paths.database.as_ref()) {
        resolve_path(&base_dir, db_path)
    } else {
        home.join("tasks.db")
    };

    let file_voice = file.as_ref().and_then(|f| f.voice.as_ref());
    let defaults = VoiceSettings::default();
    let voice = VoiceSettings {
        model_chain: file_voice
            .and_then(|v| v.model_chain.clone())
            .filter(|chain| !chain.is_empty())
            .unwrap_or(defaults.model_chain),
        retry: file_voice
            .and_then(|v| v.retry.clone())
            .unwrap_or(defaults.retry),
        provider_timeout_secs: file_voice
            .and_then(|v| v.provider_timeout_secs)
            .unwrap_or(defaults.provider_timeout_secs),
    };

    let file_server = file.as_ref().and_then(|f| f.server.as_ref());
    let default_server = ServerSettings::default();
    let host = std::env::var("VOXTASK_HOST")
        .ok()
        .or_else(|| file_server.and_then(|s| s.host.clone()))
        .unwrap_or(default_server.host);
    let port = match std::env::var("VOXTASK_PORT") {
        Ok(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("Invalid VOXTASK_PORT: {raw}"))?,
        Err(_) => file_server
            .and_then(|s| s.port)
            .unwrap_or(default_server.port),
    };

    Ok(ResolvedConfig {
        home,
        database,
        voice,
        server: ServerSettings { host, port },
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration, bypassing the cache (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
