//! Adapter interfaces for external AI providers.
//!
//! Adapters provide a unified interface for the two external services the
//! pipeline depends on: speech-to-text and language models. The pipeline
//! only sees these traits, so tests substitute scripted implementations
//! and retry/fallback logic stays provider-agnostic.

pub mod deepgram;
pub mod gemini;

use async_trait::async_trait;

// Re-export the concrete clients
pub use deepgram::DeepgramClient;
pub use gemini::GeminiClient;

use crate::voice::error::ProviderError;

/// Output of a speech-to-text call
#[derive(Debug, Clone)]
pub struct Transcript {
    /// The transcribed text, trimmed
    pub text: String,

    /// Provider confidence in [0, 1], when reported
    pub confidence: Option<f64>,

    /// Audio duration in seconds, when reported
    pub duration_secs: Option<f64>,
}

/// Trait for speech-to-text providers
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Transcribe a complete audio clip
    async fn transcribe(&self, audio: &[u8], mime_type: &str)
        -> Result<Transcript, ProviderError>;
}

/// Trait for text-generation providers
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Run one prompt against a named model and return the raw text reply
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}
