//! Transcription client with bounded retry.
//!
//! Wraps a [`SpeechToText`] provider with payload validation, a per-call
//! timeout, and a sequential retry loop. Retries are linear: the delay
//! after attempt `n` is `base_delay_ms * n`, so three attempts wait 1s
//! then 2s with the defaults. Every attempt sends a fresh copy of the
//! audio payload; nothing is reused across attempts.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::adapters::{SpeechToText, Transcript};
use crate::voice::error::{ProviderError, TranscriptionError};

/// Payload bounds enforced before any provider call.
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
pub const MIN_AUDIO_BYTES: usize = 1024;

/// MIME types the transcription boundary accepts.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "audio/webm",
    "audio/mp4",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/x-m4a",
    "audio/mp3",
];

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Retry policy for failed transcription attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds; attempt `n` waits `base * n`
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Calculate delay for a specific attempt (1-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms * u64::from(attempt.max(1)))
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Speech-to-text client with validation, timeout, and retry
pub struct Transcriber {
    provider: Arc<dyn SpeechToText>,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl Transcriber {
    /// Create a transcriber with default policy and timeout
    pub fn new(provider: Arc<dyn SpeechToText>) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    /// Override the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the per-call provider timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Transcribe an audio clip, retrying transient provider failures.
    ///
    /// Validation failures (empty, out-of-bounds size, unknown MIME type)
    /// are returned immediately and never retried.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<Transcript, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }
        if audio.len() > MAX_AUDIO_BYTES {
            return Err(TranscriptionError::AudioTooLarge {
                got_bytes: audio.len(),
                max_bytes: MAX_AUDIO_BYTES,
            });
        }
        if audio.len() < MIN_AUDIO_BYTES {
            return Err(TranscriptionError::AudioTooShort {
                got_bytes: audio.len(),
                min_bytes: MIN_AUDIO_BYTES,
            });
        }
        if !SUPPORTED_MIME_TYPES.contains(&mime_type) {
            return Err(TranscriptionError::UnsupportedMediaType(
                mime_type.to_string(),
            ));
        }

        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let call = self.provider.transcribe(audio, mime_type);
            let result = match tokio::time::timeout(self.call_timeout, call).await {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::Timeout {
                    provider: self.provider.name().to_string(),
                    seconds: self.call_timeout.as_secs(),
                }),
            };

            match result {
                Ok(transcript) => return Ok(transcript),
                Err(e) => {
                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_for_attempt(attempt);
                        warn!(
                            provider = %self.provider.name(),
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Transcription failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    error!(
                        provider = %self.provider.name(),
                        attempt,
                        error = %e,
                        "Transcription failed permanently"
                    );
                    return Err(TranscriptionError::ExhaustedRetries {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays_are_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: RetryPolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);

        let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, 1000);
    }
}
