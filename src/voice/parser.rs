//! Voice parsing engine: transcript in, task draft out.
//!
//! The engine builds one prompt, walks an ordered fallback chain of model
//! identifiers until a candidate yields text containing parseable JSON,
//! then applies deterministic normalization. Model calls are strictly
//! sequential; a later candidate runs only after the prior one failed.
//!
//! Normalization is a pure function of the raw model fields and the
//! transcript. Whatever model answered, the same raw output produces the
//! same draft.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, warn};

use crate::adapters::LanguageModel;
use crate::domain::{RawTaskFields, TaskDraft, TaskPriority, TaskStatus};
use crate::voice::error::{AttemptState, ModelAttempt, ParseError, ProviderError};
use crate::voice::recovery::{DescriptionRecovery, HeuristicRecovery};

/// Upper bound on transcript length, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 10_000;

/// Fallback chain tried in order: fast first, then lighter, then general.
pub const DEFAULT_MODEL_CHAIN: &[&str] =
    &["gemini-flash-latest", "gemini-flash-lite-latest", "gemini-pro"];

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Transcript-to-draft parser over a model fallback chain
pub struct VoiceParser {
    model: Arc<dyn LanguageModel>,
    chain: Vec<String>,
    call_timeout: Duration,
    recovery: Box<dyn DescriptionRecovery>,
}

impl VoiceParser {
    /// Create a parser with the default chain, timeout, and recovery
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            chain: default_chain(),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            recovery: Box::new(HeuristicRecovery),
        }
    }

    /// Override the model fallback chain
    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        if !chain.is_empty() {
            self.chain = chain;
        }
        self
    }

    /// Override the per-call provider timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Override the description recovery strategy
    pub fn with_recovery(mut self, recovery: Box<dyn DescriptionRecovery>) -> Self {
        self.recovery = recovery;
        self
    }

    /// Parse a transcript into a task draft.
    ///
    /// Fails fast on an empty or oversized transcript; no model is called.
    /// Otherwise walks the fallback chain and short-circuits on the first
    /// candidate whose reply contains a parseable JSON object.
    pub async fn parse(&self, transcript: &str) -> Result<TaskDraft, ParseError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(ParseError::EmptyTranscript);
        }
        let got_chars = transcript.chars().count();
        if got_chars > MAX_TRANSCRIPT_CHARS {
            return Err(ParseError::TranscriptTooLong {
                got_chars,
                max_chars: MAX_TRANSCRIPT_CHARS,
            });
        }

        let prompt = build_prompt(transcript, Local::now().date_naive());

        let mut attempts: Vec<ModelAttempt> = self
            .chain
            .iter()
            .map(|model| ModelAttempt {
                model: model.clone(),
                state: AttemptState::NotTried,
            })
            .collect();

        for (index, model) in self.chain.iter().enumerate() {
            match self.try_model(model, &prompt).await {
                Ok(raw) => {
                    attempts[index].state = AttemptState::Succeeded;
                    debug!(model = %model, "Model produced a parseable draft");
                    return Ok(normalize(&raw, transcript, self.recovery.as_ref()));
                }
                Err(message) => {
                    warn!(model = %model, error = %message, "Model failed, trying next candidate");
                    attempts[index].state = AttemptState::Failed(message);
                }
            }
        }

        error!(models = self.chain.len(), "All language models failed");
        Err(ParseError::AllModelsFailed { attempts })
    }

    /// One candidate: call, extract, parse. Any failure is a string for
    /// the ledger.
    async fn try_model(&self, model: &str, prompt: &str) -> Result<RawTaskFields, String> {
        let call = self.model.generate(model, prompt);
        let text = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => {
                return Err(ProviderError::Timeout {
                    provider: self.model.name().to_string(),
                    seconds: self.call_timeout.as_secs(),
                }
                .to_string())
            }
        };
        extract_json(&text)
    }
}

/// Default fallback chain as owned strings.
pub fn default_chain() -> Vec<String> {
    DEFAULT_MODEL_CHAIN.iter().map(|m| m.to_string()).collect()
}

/// Builds the extraction prompt around a transcript and reference date.
pub(crate) fn build_prompt(transcript: &str, today: NaiveDate) -> String {
    format!(
        r#"Extract structured task information from this input: "{transcript}"

Current date: {today}.

Return a JSON object with:
- title: Main task name (required)
- description: Additional details beyond the task name such as reasons, context, or qualifiers (null only when the input is a single clause)
- priority: LOW, MEDIUM, HIGH, or URGENT (default: MEDIUM)
- dueDate: ISO 8601 format (YYYY-MM-DDTHH:mm:ss.sssZ). Resolve "today" and "tomorrow" against the current date above. Default the time to 18:00 if only a day is given. Use null for any date before the current date
- status: TODO, IN_PROGRESS, or DONE (default: TODO)

Extract all mentioned information. Return only valid JSON."#
    )
}

/// Pulls the first-`{`-to-last-`}` span out of a model reply and parses it.
///
/// One greedy span, per the extraction contract: replies wrapping the JSON
/// in prose or code fences still parse, replies with several objects fail
/// this candidate and fall through to the next model.
fn extract_json(text: &str) -> Result<RawTaskFields, String> {
    let start = text
        .find('{')
        .ok_or_else(|| "No JSON found in response".to_string())?;
    let end = text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| "No JSON found in response".to_string())?;

    serde_json::from_str(&text[start..=end])
        .map_err(|e| format!("Invalid JSON in response: {e}"))
}

/// Deterministic cleanup of raw model fields into a draft.
///
/// Title falls back to the first 100 characters of the transcript, then to
/// "Untitled Task". Description recovery only runs when the model gave
/// nothing usable and the transcript is materially longer than the title
/// (more than 10 extra characters). The due date passes through verbatim;
/// date validation belongs to the submission path, not the parser.
pub(crate) fn normalize(
    raw: &RawTaskFields,
    transcript: &str,
    recovery: &dyn DescriptionRecovery,
) -> TaskDraft {
    let title = raw
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let lead: String = transcript.chars().take(100).collect();
            let lead = lead.trim();
            (!lead.is_empty()).then(|| lead.to_string())
        })
        .unwrap_or_else(|| "Untitled Task".to_string());

    let description = raw
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| {
            let materially_longer = transcript.chars().count() > title.chars().count() + 10;
            if materially_longer {
                recovery.recover(transcript, &title)
            } else {
                None
            }
        });

    TaskDraft {
        title,
        description,
        status: TaskStatus::from_model_value(raw.status.as_deref()),
        priority: TaskPriority::from_model_value(raw.priority.as_deref()),
        due_date: raw.due_date.clone().filter(|d| !d.trim().is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawTaskFields {
        serde_json::from_str(json).unwrap()
    }

    fn normalize_with_defaults(raw: &RawTaskFields, transcript: &str) -> TaskDraft {
        normalize(raw, transcript, &HeuristicRecovery)
    }

    #[test]
    fn test_prompt_embeds_transcript_and_date() {
        let prompt = build_prompt(
            "Call John tomorrow",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        assert!(prompt.contains("\"Call John tomorrow\""));
        assert!(prompt.contains("Current date: 2024-06-01."));
        assert!(prompt.contains("Return only valid JSON"));
    }

    #[test]
    fn test_extract_json_from_plain_object() {
        let raw = extract_json(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Buy milk"));
    }

    #[test]
    fn test_extract_json_inside_code_fence() {
        let reply = "Here you go:\n```json\n{\"title\":\"Buy milk\",\"priority\":\"HIGH\"}\n```\nDone.";
        let raw = extract_json(reply).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Buy milk"));
        assert_eq!(raw.priority.as_deref(), Some("HIGH"));
    }

    #[test]
    fn test_extract_json_without_braces_fails() {
        let err = extract_json("I could not find a task in that.").unwrap_err();
        assert_eq!(err, "No JSON found in response");
    }

    #[test]
    fn test_extract_json_reversed_braces_fail() {
        let err = extract_json("} nothing here {").unwrap_err();
        assert_eq!(err, "No JSON found in response");
    }

    #[test]
    fn test_extract_json_invalid_body_fails() {
        let err = extract_json("{ not json at all }").unwrap_err();
        assert!(err.starts_with("Invalid JSON in response"));
    }

    #[test]
    fn test_extract_json_two_objects_fail_greedily() {
        // The greedy span covers both objects and the noise between them.
        let err = extract_json(r#"{"title":"a"} or maybe {"title":"b"}"#).unwrap_err();
        assert!(err.starts_with("Invalid JSON in response"));
    }

    #[test]
    fn test_normalize_trims_model_title() {
        let draft = normalize_with_defaults(&raw(r#"{"title":"  Buy milk  "}"#), "Buy milk");
        assert_eq!(draft.title, "Buy milk");
    }

    #[test]
    fn test_normalize_title_falls_back_to_transcript_lead() {
        let transcript = "x".repeat(150);
        let draft = normalize_with_defaults(&raw("{}"), &transcript);
        assert_eq!(draft.title.chars().count(), 100);
    }

    #[test]
    fn test_normalize_title_last_resort_is_untitled() {
        let draft = normalize_with_defaults(&raw(r#"{"title":"   "}"#), "");
        assert_eq!(draft.title, "Untitled Task");
    }

    #[test]
    fn test_normalize_defaults_status_and_priority() {
        let draft = normalize_with_defaults(&raw(r#"{"title":"x"}"#), "x");
        assert_eq!(draft.status, TaskStatus::Todo);
        assert_eq!(draft.priority, TaskPriority::Medium);
    }

    #[test]
    fn test_normalize_maps_synonyms() {
        let draft = normalize_with_defaults(
            &raw(r#"{"title":"x","status":"in progress","priority":"critical"}"#),
            "x",
        );
        assert_eq!(draft.status, TaskStatus::InProgress);
        assert_eq!(draft.priority, TaskPriority::Urgent);
    }

    #[test]
    fn test_normalize_recovers_description() {
        let draft = normalize_with_defaults(
            &raw(r#"{"title":"Call John"}"#),
            "Call John tomorrow about the project",
        );
        assert_eq!(draft.description.as_deref(), Some("tomorrow about the project"));
    }

    #[test]
    fn test_normalize_skips_recovery_when_transcript_barely_longer() {
        let draft = normalize_with_defaults(
            &raw(r#"{"title":"Call John Smith"}"#),
            "Call John Smith now",
        );
        assert!(draft.description.is_none());
    }

    #[test]
    fn test_normalize_prefers_model_description() {
        let draft = normalize_with_defaults(
            &raw(r#"{"title":"Call John","description":"about the budget"}"#),
            "Call John tomorrow about the project",
        );
        assert_eq!(draft.description.as_deref(), Some("about the budget"));
    }

    #[test]
    fn test_normalize_passes_due_date_through() {
        let draft = normalize_with_defaults(
            &raw(r#"{"title":"x","dueDate":"2024-06-02T18:00:00.000Z"}"#),
            "x",
        );
        assert_eq!(draft.due_date.as_deref(), Some("2024-06-02T18:00:00.000Z"));
    }

    #[test]
    fn test_normalize_drops_blank_due_date() {
        let draft = normalize_with_defaults(&raw(r#"{"title":"x","dueDate":"  "}"#), "x");
        assert!(draft.due_date.is_none());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let fields = raw(r#"{"title":"Call John","status":"complete"}"#);
        let transcript = "Call John tomorrow about the project";
        let first = normalize_with_defaults(&fields, transcript);
        let second = normalize_with_defaults(&fields, transcript);
        assert_eq!(first, second);
    }
}
