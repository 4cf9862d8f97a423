//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"error": "..."}` with an
//! appropriate status. Conversions from the pipeline and store error
//! types centralize the status mapping so handlers can use `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::store::StoreError;
use crate::voice::error::{ParseError, TranscriptionError, VoiceError};
use crate::voice::transcriber::SUPPORTED_MIME_TYPES;

/// A user-facing API error
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found("Task not found"),
            StoreError::InvalidInput(message) => Self::bad_request(message),
            StoreError::Database(e) => {
                error!(error = %e, "Task store failure");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::EmptyAudio => {
                Self::bad_request("Audio file is empty or corrupted")
            }
            TranscriptionError::AudioTooLarge { .. } => {
                Self::payload_too_large("Audio file is too large. Maximum size is 10MB")
            }
            TranscriptionError::AudioTooShort { .. } => {
                Self::bad_request("Audio file is too small. Please upload a valid audio file")
            }
            TranscriptionError::UnsupportedMediaType(_) => Self::bad_request(format!(
                "Invalid file type. Allowed types: {}",
                SUPPORTED_MIME_TYPES.join(", ")
            )),
            TranscriptionError::ExhaustedRetries { .. } => Self::internal(err.to_string()),
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Transcription(e) => e.into(),
            VoiceError::Parse(e) => e.into(),
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        match &err {
            ParseError::EmptyTranscript => Self::bad_request("Transcript cannot be empty"),
            ParseError::TranscriptTooLong { .. } => {
                Self::bad_request("Transcript must be 10000 characters or less")
            }
            ParseError::AllModelsFailed { .. } => Self::internal(format!(
                "Failed to parse voice input: {}",
                err.last_model_error().unwrap_or("All models failed")
            )),
        }
    }
}
