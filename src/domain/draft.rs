//! Draft task produced by the voice parsing pipeline.
//!
//! A draft is not persisted. It is returned to the client for review and
//! only becomes a [`Task`](super::Task) once the user confirms it through
//! the normal create endpoint.

use serde::{Deserialize, Serialize};

use super::{TaskPriority, TaskStatus};

/// Structured fields extracted from a spoken transcript.
///
/// `due_date` stays a raw string: the language model emits an ISO-8601
/// timestamp and the draft passes it through untouched so the client can
/// apply its own date handling before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Model output as deserialized, before normalization.
///
/// Every field is optional and enums are plain strings because model JSON
/// is unreliable: keys go missing, casing drifts, and values invent
/// synonyms. Unknown keys are ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTaskFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_date: Option<String>,
}

/// Accepts a string or null; anything else (a bare number, an object)
/// deserializes to None instead of failing the whole payload.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_fields_tolerate_missing_keys() {
        let raw: RawTaskFields = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Buy milk"));
        assert!(raw.status.is_none());
        assert!(raw.due_date.is_none());
    }

    #[test]
    fn test_raw_fields_ignore_unknown_keys() {
        let raw: RawTaskFields =
            serde_json::from_str(r#"{"title":"x","confidence":0.9,"tags":["a"]}"#).unwrap();
        assert_eq!(raw.title.as_deref(), Some("x"));
    }

    #[test]
    fn test_raw_fields_tolerate_non_string_due_date() {
        let raw: RawTaskFields =
            serde_json::from_str(r#"{"title":"x","dueDate":1717200000}"#).unwrap();
        assert!(raw.due_date.is_none());
    }

    #[test]
    fn test_draft_round_trips_due_date_verbatim() {
        let draft = TaskDraft {
            title: "Call John".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: Some("2024-06-02T18:00:00.000Z".to_string()),
        };
        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("\"dueDate\":\"2024-06-02T18:00:00.000Z\""));
    }
}
