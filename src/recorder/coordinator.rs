//! Recording coordinator
//!
//! Orchestrates the capture channels and owns the recording lifecycle:
//! start, live microphone mute, stop, and the mix/mux/read-back that
//! turns session artifacts into the final blob.

use super::channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
use super::state::{RecordedBlob, RecordingConfig, RecordingState};
use super::{mixer, muxer};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecordingEvent {
    /// Recording started
    Started,
    /// Recording stopped and the blob is ready
    Stopped,
    /// Error occurred
    Error(String),
}

/// Manages the recording channels and session lifecycle
pub struct RecordingCoordinator {
    /// Current recording state
    state: Arc<RwLock<RecordingState>>,

    /// Capture channels for the current session
    channels: Vec<Box<dyn RecordingChannel>>,

    /// Directory holding this session's intermediate artifacts
    artifact_dir: Option<PathBuf>,

    /// Directory the final container is written to
    output_dir: Option<PathBuf>,

    /// Whether the current session is audio-only
    audio_only: bool,

    /// Whether the microphone is currently muted
    microphone_muted: bool,

    /// Time when recording started
    start_time: Option<Instant>,

    /// Duration of the last completed recording
    last_duration_ms: f64,

    /// Event broadcaster
    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingCoordinator {
    /// Create a new recording coordinator
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            channels: Vec::new(),
            artifact_dir: None,
            output_dir: None,
            audio_only: false,
            microphone_muted: false,
            start_time: None,
            last_duration_ms: 0.0,
            event_tx,
        }
    }

    /// Add a capture channel for the next session
    pub fn add_channel(&mut self, channel: Box<dyn RecordingChannel>) {
        tracing::info!("Adding channel: {}", channel.id());
        self.channels.push(channel);
    }

    /// Clear all channels
    pub fn clear_channels(&mut self) {
        self.channels.clear();
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    /// Whether the microphone is currently muted
    pub fn is_microphone_muted(&self) -> bool {
        self.microphone_muted
    }

    /// Recording duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match *self.state.read() {
            RecordingState::Recording | RecordingState::Processing => self
                .start_time
                .map(|t| t.elapsed().as_secs_f64() * 1000.0)
                .unwrap_or(0.0),
            _ => self.last_duration_ms,
        }
    }

    /// Start recording with the channels assembled for `config`
    pub async fn start(&mut self, config: &RecordingConfig) -> RecordingResult<()> {
        let current_state = *self.state.read();
        if current_state != RecordingState::Idle {
            return Err(RecordingError::AlreadyRecording);
        }

        let has_audio = self.channels.iter().any(|c| c.kind().is_audio());
        if config.audio_only && !has_audio {
            return Err(RecordingError::NoAudioSource);
        }
        if self.channels.is_empty() {
            return Err(RecordingError::Configuration(
                "No capture channels configured".to_string(),
            ));
        }

        tracing::info!("Starting recording to: {}", config.output_dir);

        let output_dir = PathBuf::from(&config.output_dir);
        std::fs::create_dir_all(&output_dir)?;

        let artifact_dir = output_dir.join(format!("session-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&artifact_dir)?;

        // A new recording always starts unmuted
        self.microphone_muted = false;
        for channel in &mut self.channels {
            if channel.kind().is_audio() {
                channel.set_track_enabled(true);
            }
        }

        for channel in &mut self.channels {
            channel.initialize(&artifact_dir).await?;
        }

        if let Err(e) = self.start_channels().await {
            // Roll back anything that did start so the next attempt is clean
            for channel in &mut self.channels {
                if channel.is_active() {
                    let _ = channel.stop().await;
                }
            }
            return Err(e);
        }

        self.artifact_dir = Some(artifact_dir);
        self.output_dir = Some(output_dir);
        self.audio_only = config.audio_only;
        self.start_time = Some(Instant::now());

        *self.state.write() = RecordingState::Recording;
        let _ = self.event_tx.send(RecordingEvent::Started);

        tracing::info!("Recording started");
        Ok(())
    }

    async fn start_channels(&mut self) -> RecordingResult<()> {
        for channel in &mut self.channels {
            channel.start().await?;
        }
        Ok(())
    }

    /// Mute or unmute the microphone while recording.
    ///
    /// Updates the enabled flag on every current microphone track; the
    /// track keeps its length by recording silence while muted.
    pub fn set_microphone_muted(&mut self, muted: bool) {
        self.microphone_muted = muted;

        for channel in &mut self.channels {
            if channel.kind() == ChannelKind::Microphone {
                channel.set_track_enabled(!muted);
            }
        }

        tracing::info!("Microphone muted: {}", muted);
    }

    /// Stop recording and produce the final blob
    pub async fn stop(&mut self) -> RecordingResult<RecordedBlob> {
        let current_state = *self.state.read();
        if current_state != RecordingState::Recording {
            return Err(RecordingError::NotRecording);
        }

        tracing::info!("Stopping recording");
        *self.state.write() = RecordingState::Processing;

        let result = self.finish_recording().await;

        // The recorder always returns to an idle, retryable state
        self.artifact_dir = None;
        self.output_dir = None;
        self.start_time = None;
        *self.state.write() = RecordingState::Idle;

        match &result {
            Ok(blob) => {
                self.last_duration_ms = blob.duration_ms;
                let _ = self.event_tx.send(RecordingEvent::Stopped);
                tracing::info!(
                    "Recording stopped: {} ({} bytes, {:.0}ms)",
                    blob.filename,
                    blob.data.len(),
                    blob.duration_ms
                );
            }
            Err(e) => {
                let _ = self.event_tx.send(RecordingEvent::Error(e.to_string()));
            }
        }

        result
    }

    async fn finish_recording(&mut self) -> RecordingResult<RecordedBlob> {
        let elapsed_ms = self
            .start_time
            .map(|t| t.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        for channel in &mut self.channels {
            if channel.is_active() {
                channel.stop().await?;
            }
        }

        let artifact_dir = self
            .artifact_dir
            .clone()
            .ok_or_else(|| RecordingError::Configuration("No session in progress".to_string()))?;
        let output_dir = self
            .output_dir
            .clone()
            .ok_or_else(|| RecordingError::Configuration("No session in progress".to_string()))?;

        // Collect the audio artifacts that actually materialized
        let audio_artifacts: Vec<PathBuf> = self
            .channels
            .iter()
            .filter(|c| c.kind().is_audio())
            .flat_map(|c| c.output_files())
            .filter(|p| p.exists())
            .collect();

        let mixed_track = if audio_artifacts.is_empty() {
            None
        } else {
            let mixed_path = artifact_dir.join("mixed.wav");
            let inputs: Vec<&std::path::Path> =
                audio_artifacts.iter().map(|p| p.as_path()).collect();
            mixer::mix_wav_files(&inputs, &mixed_path)?;
            Some(mixed_path)
        };

        let filename = RecordedBlob::generate_filename();
        let final_path = output_dir.join(&filename);

        let content_type = if self.audio_only {
            let mixed = mixed_track.as_deref().ok_or(RecordingError::NoAudioSource)?;
            muxer::mux_audio_only(mixed, &final_path)?;
            "audio/webm"
        } else {
            let video_track = artifact_dir.join("video.webm");
            if !video_track.exists() {
                return Err(RecordingError::Mux(
                    "Screen capture produced no video track".to_string(),
                ));
            }
            muxer::mux_video(&video_track, mixed_track.as_deref(), &final_path)?;
            "video/webm"
        };

        let data = std::fs::read(&final_path)?;
        if data.is_empty() {
            return Err(RecordingError::Mux(
                "Muxing produced an empty container".to_string(),
            ));
        }

        let duration_ms = muxer::probe_duration_ms(&final_path).unwrap_or(elapsed_ms);

        // Intermediate artifacts are no longer needed once the container
        // is in memory
        if let Err(e) = std::fs::remove_dir_all(&artifact_dir) {
            tracing::warn!("Failed to clean up session artifacts: {}", e);
        }

        Ok(RecordedBlob {
            filename,
            path: final_path,
            data,
            content_type: content_type.to_string(),
            duration_ms,
        })
    }
}

impl Default for RecordingCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockAudioChannel {
        id: String,
        kind: ChannelKind,
        enabled: Arc<AtomicBool>,
        active: bool,
    }

    impl MockAudioChannel {
        fn new(id: &str, kind: ChannelKind) -> (Self, Arc<AtomicBool>) {
            let enabled = Arc::new(AtomicBool::new(true));
            (
                Self {
                    id: id.to_string(),
                    kind,
                    enabled: enabled.clone(),
                    active: false,
                },
                enabled,
            )
        }
    }

    #[async_trait]
    impl RecordingChannel for MockAudioChannel {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> ChannelKind {
            self.kind
        }

        async fn initialize(&mut self, _artifact_dir: &Path) -> RecordingResult<()> {
            Ok(())
        }

        async fn start(&mut self) -> RecordingResult<()> {
            self.active = true;
            Ok(())
        }

        async fn stop(&mut self) -> RecordingResult<()> {
            self.active = false;
            Ok(())
        }

        fn set_track_enabled(&mut self, enabled: bool) {
            self.enabled.store(enabled, Ordering::SeqCst);
        }

        fn is_track_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn output_files(&self) -> Vec<PathBuf> {
            Vec::new()
        }
    }

    #[test]
    fn test_mute_updates_all_microphone_tracks() {
        let mut coordinator = RecordingCoordinator::new();
        let (mic_a, enabled_a) = MockAudioChannel::new("mic-a", ChannelKind::Microphone);
        let (mic_b, enabled_b) = MockAudioChannel::new("mic-b", ChannelKind::Microphone);
        coordinator.add_channel(Box::new(mic_a));
        coordinator.add_channel(Box::new(mic_b));

        coordinator.set_microphone_muted(true);
        assert!(coordinator.is_microphone_muted());
        assert!(!enabled_a.load(Ordering::SeqCst));
        assert!(!enabled_b.load(Ordering::SeqCst));

        coordinator.set_microphone_muted(false);
        assert!(enabled_a.load(Ordering::SeqCst));
        assert!(enabled_b.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_start_requires_audio_source_in_audio_only_mode() {
        let mut coordinator = RecordingCoordinator::new();

        let config = RecordingConfig {
            source_id: None,
            audio_only: true,
            capture_microphone: false,
            microphone_device_id: None,
            capture_system_audio: false,
            output_dir: std::env::temp_dir().to_string_lossy().to_string(),
        };

        let result = coordinator.start(&config).await;
        assert!(matches!(result, Err(RecordingError::NoAudioSource)));
        assert_eq!(coordinator.state(), RecordingState::Idle);
    }

    #[tokio::test]
    async fn test_start_unmutes_microphone() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = RecordingCoordinator::new();
        let (mic, enabled) = MockAudioChannel::new("mic", ChannelKind::Microphone);
        coordinator.add_channel(Box::new(mic));
        coordinator.set_microphone_muted(true);
        assert!(!enabled.load(Ordering::SeqCst));

        let config = RecordingConfig {
            source_id: None,
            audio_only: true,
            capture_microphone: true,
            microphone_device_id: None,
            capture_system_audio: false,
            output_dir: dir.path().to_string_lossy().to_string(),
        };

        coordinator.start(&config).await.unwrap();

        assert!(!coordinator.is_microphone_muted());
        assert!(enabled.load(Ordering::SeqCst));
        assert_eq!(coordinator.state(), RecordingState::Recording);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut coordinator = RecordingCoordinator::new();
        let (mic, _) = MockAudioChannel::new("mic", ChannelKind::Microphone);
        coordinator.add_channel(Box::new(mic));

        let config = RecordingConfig {
            source_id: None,
            audio_only: true,
            capture_microphone: true,
            microphone_device_id: None,
            capture_system_audio: false,
            output_dir: dir.path().to_string_lossy().to_string(),
        };

        coordinator.start(&config).await.unwrap();
        let result = coordinator.start(&config).await;

        assert!(matches!(result, Err(RecordingError::AlreadyRecording)));
    }
}
