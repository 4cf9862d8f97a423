//! Voice endpoints: transcript parsing and audio transcription.

use axum::extract::multipart::Multipart;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::domain::TaskDraft;

/// Response body for both voice endpoints.
#[derive(Debug, Serialize)]
pub struct VoiceParseResponse {
    pub transcript: String,
    pub parsed: TaskDraft,
}

/// POST /api/voice/parse
///
/// Body: `{"transcript": "..."}`. Returns the trimmed transcript plus the
/// structured draft extracted from it.
pub async fn parse_transcript(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<VoiceParseResponse>, ApiError> {
    let transcript = match body.get("transcript") {
        None | Some(Value::Null) => return Err(ApiError::bad_request("Transcript is required")),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(ApiError::bad_request("Transcript must be a string")),
    };

    let parsed = state.pipeline.parse(&transcript).await?;
    Ok(Json(VoiceParseResponse { transcript, parsed }))
}

/// POST /api/voice/transcribe
///
/// Multipart body with an `audio` field carrying the clip bytes and their
/// content type. Size and media-type limits are enforced by the
/// transcriber, so undersize, oversize and unknown formats come back as
/// the same errors regardless of transport.
pub async fn transcribe_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VoiceParseResponse>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("audio") {
            let mime_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?;
            audio = Some((data.to_vec(), mime_type));
            break;
        }
    }

    let Some((data, mime_type)) = audio else {
        return Err(ApiError::bad_request("Audio file is required"));
    };

    let (transcript, parsed) = state.pipeline.process(&data, &mime_type).await?;
    info!(chars = transcript.text.chars().count(), "Transcription complete");

    Ok(Json(VoiceParseResponse {
        transcript: transcript.text,
        parsed,
    }))
}
