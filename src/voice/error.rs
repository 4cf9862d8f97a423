//! Error types for the voice pipeline.

use thiserror::Error;

/// Errors from turning audio into a transcript.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Audio data is empty")]
    EmptyAudio,

    #[error("Unsupported audio format: {0}")]
    UnsupportedMediaType(String),

    #[error("Audio exceeds {max_bytes} bytes (got {got_bytes})")]
    AudioTooLarge { got_bytes: usize, max_bytes: usize },

    #[error("Audio is below {min_bytes} bytes (got {got_bytes})")]
    AudioTooShort { got_bytes: usize, min_bytes: usize },

    #[error("Transcription failed after {attempts} attempts: {source}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
}

/// Either half of the pipeline failing, for callers that run both.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors from turning a transcript into structured task fields.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("Transcript exceeds {max_chars} characters (got {got_chars})")]
    TranscriptTooLong { got_chars: usize, max_chars: usize },

    #[error("All language models failed to produce a usable task")]
    AllModelsFailed {
        /// Per-model outcomes, in the order models were tried.
        attempts: Vec<ModelAttempt>,
    },
}

impl ParseError {
    /// Message of the last model failure, when there is one.
    pub fn last_model_error(&self) -> Option<&str> {
        match self {
            Self::AllModelsFailed { attempts } => attempts
                .iter()
                .rev()
                .find_map(|a| match &a.state {
                    AttemptState::Failed(message) => Some(message.as_str()),
                    _ => None,
                }),
            _ => None,
        }
    }
}

/// One entry in the fallback ledger: a model and what happened with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub state: AttemptState,
}

/// Outcome of a single model in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// A prior model succeeded before this one was reached.
    NotTried,
    /// The model was called but produced no usable task.
    Failed(String),
    Succeeded,
}

/// A single failed call to an external provider.
///
/// Wraps transport errors, non-success HTTP statuses, and response bodies
/// that did not match the provider's documented shape.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} response missing expected field: {field}")]
    MalformedResponse {
        provider: String,
        field: &'static str,
    },

    #[error("{provider} returned an empty result")]
    EmptyResult { provider: String },

    #[error("{provider} call timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },
}
