//! Voice-to-task pipeline.
//!
//! This module turns spoken audio into an editable task draft. The flow:
//!
//! 1. **Transcriber**: ships audio to a speech-to-text provider with
//!    bounded, sequential retry
//! 2. **Parser**: prompts a language model over an ordered fallback chain,
//!    extracts JSON from the free-form reply, and normalizes it
//! 3. **Recovery**: heuristics that rescue a description the model dropped
//!
//! # Architecture
//!
//! ```text
//! audio bytes -> Transcriber -> transcript -> VoiceParser -> TaskDraft
//!                 (retry)                     (fallback chain)
//! ```
//!
//! The draft is returned to the client for review; nothing in this module
//! persists anything.

pub mod error;
pub mod parser;
pub mod recovery;
pub mod transcriber;

// Re-export key types
pub use error::{
    AttemptState, ModelAttempt, ParseError, ProviderError, TranscriptionError, VoiceError,
};
pub use parser::{VoiceParser, DEFAULT_MODEL_CHAIN, MAX_TRANSCRIPT_CHARS};
pub use recovery::{DescriptionRecovery, HeuristicRecovery};
pub use transcriber::{RetryPolicy, Transcriber, MAX_AUDIO_BYTES, MIN_AUDIO_BYTES};

use tracing::instrument;

use crate::adapters::Transcript;
use crate::domain::TaskDraft;

/// Both pipeline stages behind one handle.
///
/// Callers that only need one stage use [`Transcriber`] or [`VoiceParser`]
/// directly; this exists for the audio-in, draft-out flow.
pub struct VoicePipeline {
    transcriber: Transcriber,
    parser: VoiceParser,
}

impl VoicePipeline {
    pub fn new(transcriber: Transcriber, parser: VoiceParser) -> Self {
        Self {
            transcriber,
            parser,
        }
    }

    /// Transcribe an audio clip; see [`Transcriber::transcribe`].
    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<Transcript, TranscriptionError> {
        self.transcriber.transcribe(audio, mime_type).await
    }

    /// Parse a transcript into a draft; see [`VoiceParser::parse`].
    pub async fn parse(&self, transcript: &str) -> Result<TaskDraft, ParseError> {
        self.parser.parse(transcript).await
    }

    /// Full flow: transcribe the clip, then parse the transcript.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn process(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<(Transcript, TaskDraft), VoiceError> {
        let transcript = self.transcriber.transcribe(audio, mime_type).await?;
        let draft = self.parser.parse(&transcript.text).await?;
        Ok((transcript, draft))
    }
}
