//! voxtask - voice-driven task tracker
//!
//! A task tracker backend with a voice front door: spoken audio is
//! transcribed by a speech-to-text provider, parsed into structured task
//! fields by a language model, and returned as an editable draft the user
//! confirms into a regular task.
//!
//! # Architecture
//!
//! The core is the voice-to-task pipeline:
//! - Transcription with bounded, linear-backoff retry
//! - An ordered model fallback chain with per-candidate failure tracking
//! - JSON extraction from free-form model replies
//! - Deterministic normalization with heuristic description recovery
//!
//! # Modules
//!
//! - `adapters`: External AI provider clients (Deepgram, Gemini)
//! - `voice`: The pipeline core (transcriber, parser, recovery)
//! - `domain`: Data structures (Task, TaskDraft, inputs, filters)
//! - `store`: SQLite task persistence
//! - `server`: HTTP API (axum)
//! - `capture`: Audio clip assembly and validation
//! - `dates`: Calendar-day due-date policy
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Start the HTTP API
//! voxtask serve
//!
//! # Parse a transcript from the shell
//! voxtask parse "Call John tomorrow about the project"
//!
//! # Transcribe and parse a recorded clip
//! voxtask transcribe memo.webm
//! ```

pub mod adapters;
pub mod capture;
pub mod cli;
pub mod config;
pub mod dates;
pub mod domain;
pub mod server;
pub mod store;
pub mod voice;

// Re-export main types at crate root for convenience
pub use adapters::{DeepgramClient, GeminiClient, LanguageModel, SpeechToText, Transcript};
pub use capture::{AudioClip, CaptureError, ClipRecorder};
pub use domain::{
    CreateTaskInput, Task, TaskDraft, TaskFilter, TaskPriority, TaskStatus, UpdateTaskInput,
};
pub use store::{SqliteTaskStore, StoreError, TaskStore};
pub use voice::{
    ParseError, RetryPolicy, Transcriber, TranscriptionError, VoiceError, VoiceParser,
    VoicePipeline,
};
