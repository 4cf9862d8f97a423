//! Audio clip capture.
//!
//! Assembles streamed audio chunks into one encoded clip and validates it
//! before it reaches the transcription client. Capture is single-flight: a
//! recorder holds a busy flag and refuses a second capture while one is in
//! progress, since the voice flow is one user doing one thing.

use std::mem;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::voice::transcriber::{MAX_AUDIO_BYTES, MIN_AUDIO_BYTES, SUPPORTED_MIME_TYPES};

/// MIME types a capture may declare. The transcription list plus flac,
/// which some desktop recorders emit.
pub const CAPTURE_MIME_TYPES: &[&str] = &[
    "audio/webm",
    "audio/mp4",
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/x-m4a",
    "audio/mp3",
    "audio/flac",
];

/// Errors from assembling or validating a capture
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("A capture is already in progress")]
    Busy,

    #[error("No capture is in progress")]
    NotCapturing,

    #[error("Unsupported capture format: {0}")]
    UnsupportedMediaType(String),

    #[error("Recording is empty")]
    Empty,

    #[error("Recording is too short: {got_bytes} bytes (minimum {min_bytes})")]
    TooShort { got_bytes: usize, min_bytes: usize },

    #[error("Recording is too large: {got_bytes} bytes (maximum {max_bytes})")]
    TooLarge { got_bytes: usize, max_bytes: usize },
}

/// A finished, validated clip ready for transcription
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Content hash (SHA256, 12 chars), stable across identical recordings
    pub id: String,

    /// Declared MIME type
    pub mime_type: String,

    /// The encoded audio
    pub data: Vec<u8>,
}

impl AudioClip {
    /// Build a clip from raw bytes, validating size bounds and MIME type.
    pub fn from_bytes(data: Vec<u8>, mime_type: &str) -> Result<Self, CaptureError> {
        if !CAPTURE_MIME_TYPES.contains(&mime_type) {
            return Err(CaptureError::UnsupportedMediaType(mime_type.to_string()));
        }
        if data.is_empty() {
            return Err(CaptureError::Empty);
        }
        if data.len() < MIN_AUDIO_BYTES {
            return Err(CaptureError::TooShort {
                got_bytes: data.len(),
                min_bytes: MIN_AUDIO_BYTES,
            });
        }
        if data.len() > MAX_AUDIO_BYTES {
            return Err(CaptureError::TooLarge {
                got_bytes: data.len(),
                max_bytes: MAX_AUDIO_BYTES,
            });
        }

        Ok(Self {
            id: content_hash(&data),
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// True when this clip can go straight to the transcription boundary.
    pub fn transcribable(&self) -> bool {
        SUPPORTED_MIME_TYPES.contains(&self.mime_type.as_str())
    }
}

/// Single-flight chunk recorder
pub struct ClipRecorder {
    mime_type: String,
    chunks: Vec<Vec<u8>>,
    capturing: bool,
}

impl ClipRecorder {
    /// Create a recorder for a declared MIME type
    pub fn new(mime_type: &str) -> Result<Self, CaptureError> {
        if !CAPTURE_MIME_TYPES.contains(&mime_type) {
            return Err(CaptureError::UnsupportedMediaType(mime_type.to_string()));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            chunks: Vec::new(),
            capturing: false,
        })
    }

    /// Begin a capture. Fails while another capture is in flight.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.capturing {
            return Err(CaptureError::Busy);
        }
        self.chunks.clear();
        self.capturing = true;
        Ok(())
    }

    /// Append one encoded chunk to the in-flight capture.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<(), CaptureError> {
        if !self.capturing {
            return Err(CaptureError::NotCapturing);
        }
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Whether a capture is currently in flight.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Finish the capture.
    ///
    /// A cancelled stop discards everything and yields no clip. Otherwise
    /// the chunks are assembled into one clip and validated; an
    /// out-of-bounds recording is an error, not a transcription attempt.
    pub fn stop(&mut self, cancelled: bool) -> Result<Option<AudioClip>, CaptureError> {
        if !self.capturing {
            return Err(CaptureError::NotCapturing);
        }
        self.capturing = false;
        let chunks = mem::take(&mut self.chunks);

        if cancelled {
            return Ok(None);
        }

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk);
        }

        AudioClip::from_bytes(data, &self.mime_type).map(Some)
    }
}

/// SHA256 hash of clip content (first 12 hex chars).
fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{:x}", result)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(byte: u8, len: usize) -> Vec<u8> {
        vec![byte; len]
    }

    #[test]
    fn test_capture_assembles_chunks_in_order() {
        let mut recorder = ClipRecorder::new("audio/webm").unwrap();
        recorder.start().unwrap();
        recorder.push_chunk(chunk(1, 600)).unwrap();
        recorder.push_chunk(chunk(2, 600)).unwrap();

        let clip = recorder.stop(false).unwrap().unwrap();
        assert_eq!(clip.data.len(), 1200);
        assert_eq!(clip.data[0], 1);
        assert_eq!(clip.data[1199], 2);
        assert_eq!(clip.mime_type, "audio/webm");
    }

    #[test]
    fn test_second_start_is_rejected_while_busy() {
        let mut recorder = ClipRecorder::new("audio/webm").unwrap();
        recorder.start().unwrap();
        assert!(matches!(recorder.start(), Err(CaptureError::Busy)));

        recorder.stop(true).unwrap();
        assert!(recorder.start().is_ok());
    }

    #[test]
    fn test_cancelled_stop_discards_audio() {
        let mut recorder = ClipRecorder::new("audio/webm").unwrap();
        recorder.start().unwrap();
        recorder.push_chunk(chunk(1, 2048)).unwrap();

        assert!(recorder.stop(true).unwrap().is_none());

        // The discarded chunks do not leak into the next capture.
        recorder.start().unwrap();
        recorder.push_chunk(chunk(2, 2048)).unwrap();
        let clip = recorder.stop(false).unwrap().unwrap();
        assert_eq!(clip.data.len(), 2048);
        assert!(clip.data.iter().all(|&b| b == 2));
    }

    #[test]
    fn test_undersize_recording_is_rejected() {
        let mut recorder = ClipRecorder::new("audio/webm").unwrap();
        recorder.start().unwrap();
        recorder.push_chunk(chunk(1, 512)).unwrap();
        assert!(matches!(
            recorder.stop(false),
            Err(CaptureError::TooShort { got_bytes: 512, .. })
        ));
    }

    #[test]
    fn test_oversize_recording_is_rejected() {
        let oversized = chunk(0, MAX_AUDIO_BYTES + 1);
        assert!(matches!(
            AudioClip::from_bytes(oversized, "audio/webm"),
            Err(CaptureError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_empty_stop_is_rejected() {
        let mut recorder = ClipRecorder::new("audio/webm").unwrap();
        recorder.start().unwrap();
        assert!(matches!(recorder.stop(false), Err(CaptureError::Empty)));
    }

    #[test]
    fn test_unknown_mime_type_is_rejected() {
        assert!(matches!(
            ClipRecorder::new("video/mp4"),
            Err(CaptureError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_flac_is_capturable_but_not_transcribable() {
        let clip = AudioClip::from_bytes(chunk(0, 2048), "audio/flac").unwrap();
        assert!(!clip.transcribable());

        let clip = AudioClip::from_bytes(chunk(0, 2048), "audio/webm").unwrap();
        assert!(clip.transcribable());
    }

    #[test]
    fn test_clip_id_is_stable_content_hash() {
        let a = AudioClip::from_bytes(chunk(7, 2048), "audio/webm").unwrap();
        let b = AudioClip::from_bytes(chunk(7, 2048), "audio/webm").unwrap();
        let c = AudioClip::from_bytes(chunk(8, 2048), "audio/webm").unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 12);
    }
}
