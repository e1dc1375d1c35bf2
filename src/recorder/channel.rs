//! Recording channel abstraction
//!
//! A channel is one capture pipeline (screen frames, microphone audio,
//! system audio) writing its artifact into the session directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by recording channels and the coordinator
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording in progress")]
    NotRecording,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("No audio sources available. Please enable system audio or microphone in the settings.")]
    NoAudioSource,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Muxing failed: {0}")]
    Mux(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;

/// Kind of capture a channel performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Screen/window video frames
    Screen,
    /// Microphone input
    Microphone,
    /// System audio (loopback) output
    SystemAudio,
}

impl ChannelKind {
    /// Whether this channel carries an audio track
    pub fn is_audio(&self) -> bool {
        matches!(self, ChannelKind::Microphone | ChannelKind::SystemAudio)
    }
}

/// A single capture pipeline managed by the coordinator
#[async_trait]
pub trait RecordingChannel: Send {
    /// Stable identifier used in logs and artifact names
    fn id(&self) -> &str;

    /// What this channel captures
    fn kind(&self) -> ChannelKind;

    /// Prepare the channel to write into the session artifact directory
    async fn initialize(&mut self, artifact_dir: &Path) -> RecordingResult<()>;

    /// Begin capturing
    async fn start(&mut self) -> RecordingResult<()>;

    /// Stop capturing and flush the artifact to disk
    async fn stop(&mut self) -> RecordingResult<()>;

    /// Enable or disable the channel's track while capturing.
    ///
    /// Disabled audio tracks keep producing samples (silence) so the
    /// track length matches the recording. Non-audio channels ignore this.
    fn set_track_enabled(&mut self, _enabled: bool) {}

    /// Whether the channel's track is currently enabled
    fn is_track_enabled(&self) -> bool {
        true
    }

    /// Whether the channel is currently capturing
    fn is_active(&self) -> bool;

    /// Artifact files this channel has produced
    fn output_files(&self) -> Vec<PathBuf>;
}
