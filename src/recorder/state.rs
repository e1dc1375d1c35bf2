//! Recording state management
//!
//! Defines the recording state machine and the shape of a finished
//! recording.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current state of the recording system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    Idle,
    /// Currently recording
    Recording,
    /// Mixing and muxing captured artifacts
    Processing,
    /// Recording completed
    Complete,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Configuration for starting a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingConfig {
    /// Capture source ID (screen or window). None picks the first
    /// available source.
    pub source_id: Option<String>,

    /// Record audio only (no screen capture)
    pub audio_only: bool,

    /// Whether to capture the microphone
    pub capture_microphone: bool,

    /// Microphone device ID (if capturing)
    pub microphone_device_id: Option<String>,

    /// Whether to capture system audio
    pub capture_system_audio: bool,

    /// Directory for session artifacts and the final container
    pub output_dir: String,
}

/// A completed recording: the muxed container read back into memory,
/// ready for upload. Dropped after the upload attempt resolves.
#[derive(Debug, Clone)]
pub struct RecordedBlob {
    /// Generated filename, `recording-<unix-millis>.webm`
    pub filename: String,

    /// Where the container was written
    pub path: PathBuf,

    /// The container bytes
    pub data: Vec<u8>,

    /// `video/webm` or `audio/webm`
    pub content_type: String,

    /// Total duration in milliseconds
    pub duration_ms: f64,
}

impl RecordedBlob {
    /// Generate a timestamped recording filename
    pub fn generate_filename() -> String {
        format!("recording-{}.webm", Utc::now().timestamp_millis())
    }
}

/// Summary of a completed recording returned to the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingOutput {
    /// Generated filename
    pub filename: String,

    /// Path of the muxed container on disk
    pub path: String,

    /// Size of the container in bytes
    pub size_bytes: u64,

    /// Content type of the container
    pub content_type: String,

    /// Total duration in milliseconds
    pub duration_ms: f64,
}

impl From<&RecordedBlob> for RecordingOutput {
    fn from(blob: &RecordedBlob) -> Self {
        Self {
            filename: blob.filename.clone(),
            path: blob.path.to_string_lossy().to_string(),
            size_bytes: blob.data.len() as u64,
            content_type: blob.content_type.clone(),
            duration_ms: blob.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_filename_carries_timestamp() {
        let filename = RecordedBlob::generate_filename();

        let millis = filename
            .strip_prefix("recording-")
            .and_then(|rest| rest.strip_suffix(".webm"))
            .and_then(|ts| ts.parse::<u64>().ok())
            .expect("filename should be recording-<unix-millis>.webm");

        // Sanity: a plausible unix-millisecond timestamp
        assert!(millis > 1_600_000_000_000);
    }

    #[test]
    fn test_recording_state_serializes_lowercase() {
        let json = serde_json::to_string(&RecordingState::Recording).unwrap();
        assert_eq!(json, "\"recording\"");
    }
}
