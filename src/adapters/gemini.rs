//! Gemini text-generation client.
//!
//! Endpoint: POST /v1beta/models/{model}:generateContent
//! Auth: x-goog-api-key header
//!
//! The model name is a call parameter rather than client state because the
//! parsing engine walks a fallback chain of models over one client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::voice::error::ProviderError;

const GENERATE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini generateContent client
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .context("GEMINI_API_KEY environment variable required")?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/{}:generateContent", GENERATE_URL, model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: "gemini".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;

        let content = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .ok_or(ProviderError::MalformedResponse {
                provider: "gemini".to_string(),
                field: "candidates[0].content",
            })?;

        // Long replies arrive split across parts
        let text = content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<String>()
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(ProviderError::EmptyResult {
                provider: "gemini".to_string(),
            });
        }

        Ok(text)
    }
}
