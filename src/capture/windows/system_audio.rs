//! Windows System Audio Capture using WASAPI Loopback
//!
//! On Windows, system audio is captured by opening an input stream on
//! the default *output* device (WASAPI loopback). Samples flow through
//! the same shared track buffer as the microphone channel.

use crate::capture::audio::{flush_samples, SharedWavWriter, TrackBuffer, FLUSH_INTERVAL};
use crate::recorder::channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat};
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Get the default output device for loopback capture
fn get_default_output_device() -> Option<Device> {
    let host = cpal::default_host();
    host.default_output_device()
}

/// Check if system audio capture is available
pub fn is_system_audio_available() -> bool {
    get_default_output_device().is_some()
}

/// System audio capture channel for Windows
pub struct SystemAudioCaptureChannel {
    id: String,
    is_recording: Arc<AtomicBool>,
    buffer: Arc<TrackBuffer>,
    writer: SharedWavWriter,
    artifact_path: Option<PathBuf>,
    stream_thread: Option<std::thread::JoinHandle<()>>,
    flush_task: Option<tokio::task::JoinHandle<()>>,
}

impl SystemAudioCaptureChannel {
    /// Create a new system audio capture channel
    pub fn new() -> Self {
        Self {
            id: "system-audio".to_string(),
            is_recording: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(TrackBuffer::new()),
            writer: Arc::new(Mutex::new(None)),
            artifact_path: None,
            stream_thread: None,
            flush_task: None,
        }
    }
}

impl Default for SystemAudioCaptureChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the loopback stream on a dedicated thread until `is_recording`
/// clears
fn run_loopback_stream(
    device: Device,
    buffer: Arc<TrackBuffer>,
    is_recording: Arc<AtomicBool>,
) -> RecordingResult<(std::thread::JoinHandle<()>, WavSpec)> {
    let config = device.default_output_config().map_err(|e| {
        RecordingError::DeviceNotFound(format!("Failed to read output config: {}", e))
    })?;

    let spec = WavSpec {
        channels: config.channels(),
        sample_rate: config.sample_rate().0,
        bits_per_sample: 16,
        sample_format: WavSampleFormat::Int,
    };

    let sample_format = config.sample_format();
    let stream_config = config.into();

    let handle = std::thread::spawn(move || {
        let err_fn = |e| tracing::warn!("Loopback stream error: {}", e);

        // WASAPI interprets an input stream on an output device as
        // loopback capture.
        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                {
                    let buffer = buffer.clone();
                    move |data: &[i16], _: &cpal::InputCallbackInfo| buffer.push(data)
                },
                err_fn,
                None,
            ),
            _ => device.build_input_stream(
                &stream_config,
                {
                    let buffer = buffer.clone();
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        buffer.push(&converted);
                    }
                },
                err_fn,
                None,
            ),
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Failed to build loopback stream: {}", e);
                return;
            }
        };

        if let Err(e) = stream.play() {
            tracing::error!("Failed to start loopback stream: {}", e);
            return;
        }

        while is_recording.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }

        drop(stream);
    });

    Ok((handle, spec))
}

#[async_trait]
impl RecordingChannel for SystemAudioCaptureChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::SystemAudio
    }

    async fn initialize(&mut self, artifact_dir: &Path) -> RecordingResult<()> {
        if !is_system_audio_available() {
            return Err(RecordingError::DeviceNotFound(
                "No output device found for system audio capture".to_string(),
            ));
        }

        self.artifact_path = Some(artifact_dir.join("system-audio.wav"));

        tracing::info!("System audio channel initialized");
        Ok(())
    }

    async fn start(&mut self) -> RecordingResult<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::AlreadyRecording);
        }

        let artifact_path = self
            .artifact_path
            .clone()
            .ok_or_else(|| RecordingError::Configuration("Artifact path not set".to_string()))?;

        let device = get_default_output_device().ok_or_else(|| {
            RecordingError::DeviceNotFound(
                "No output device found for system audio capture".to_string(),
            )
        })?;

        self.is_recording.store(true, Ordering::SeqCst);
        self.buffer.set_enabled(true);

        let (handle, spec) =
            run_loopback_stream(device, self.buffer.clone(), self.is_recording.clone())?;
        self.stream_thread = Some(handle);

        let writer = WavWriter::create(&artifact_path, spec).map_err(|e| {
            RecordingError::Configuration(format!("Failed to create {:?}: {}", artifact_path, e))
        })?;
        *self.writer.lock() = Some(writer);

        let buffer = self.buffer.clone();
        let shared_writer = self.writer.clone();
        let is_recording = self.is_recording.clone();
        self.flush_task = Some(tokio::spawn(async move {
            while is_recording.load(Ordering::SeqCst) {
                tokio::time::sleep(FLUSH_INTERVAL).await;
                flush_samples(&buffer, &shared_writer);
            }
        }));

        tracing::info!("System audio capture started");
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        if !self.is_recording.load(Ordering::SeqCst) {
            return Err(RecordingError::NotRecording);
        }

        self.is_recording.store(false, Ordering::SeqCst);

        if let Some(task) = self.flush_task.take() {
            let _ = task.await;
        }

        if let Some(handle) = self.stream_thread.take() {
            let _ = tokio::task::spawn_blocking(move || handle.join()).await;
        }

        flush_samples(&self.buffer, &self.writer);

        if let Some(writer) = self.writer.lock().take() {
            writer.finalize().map_err(|e| {
                RecordingError::Configuration(format!("Failed to finalize WAV artifact: {}", e))
            })?;
        }

        tracing::info!("System audio capture stopped");
        Ok(())
    }

    fn set_track_enabled(&mut self, enabled: bool) {
        self.buffer.set_enabled(enabled);
    }

    fn is_track_enabled(&self) -> bool {
        self.buffer.is_enabled()
    }

    fn is_active(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    fn output_files(&self) -> Vec<PathBuf> {
        self.artifact_path.iter().cloned().collect()
    }
}
