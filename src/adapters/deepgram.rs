//! Deepgram speech-to-text client.
//!
//! Endpoint: POST /v1/listen (pre-recorded)
//! Auth: Token header

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{SpeechToText, Transcript};
use crate::voice::error::ProviderError;

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";
const DEFAULT_MODEL: &str = "nova-2";

/// Deepgram pre-recorded transcription client
pub struct DeepgramClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

/// Top-level Deepgram response
#[derive(Debug, Deserialize)]
struct ListenResponse {
    #[serde(default)]
    metadata: Option<ListenMetadata>,
    #[serde(default)]
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenMetadata {
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f64>,
}

impl DeepgramClient {
    /// Create a new client
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPGRAM_API_KEY")
            .context("DEEPGRAM_API_KEY environment variable required")?;
        let model =
            std::env::var("DEEPGRAM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }
}

#[async_trait]
impl SpeechToText for DeepgramClient {
    fn name(&self) -> &str {
        "deepgram"
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<Transcript, ProviderError> {
        let response = self
            .client
            .post(LISTEN_URL)
            .query(&[
                ("model", self.model.as_str()),
                ("language", "en-US"),
                ("smart_format", "true"),
                ("punctuate", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", mime_type)
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "deepgram".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ListenResponse = response.json().await?;

        let alternative = parsed
            .results
            .as_ref()
            .and_then(|r| r.channels.first())
            .and_then(|c| c.alternatives.first())
            .ok_or(ProviderError::MalformedResponse {
                provider: "deepgram".to_string(),
                field: "results.channels[0].alternatives[0]",
            })?;

        let text = alternative.transcript.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResult {
                provider: "deepgram".to_string(),
            });
        }

        Ok(Transcript {
            text,
            confidence: alternative.confidence,
            duration_secs: parsed.metadata.and_then(|m| m.duration),
        })
    }
}
