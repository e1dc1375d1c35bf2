//! Microphone capture
//!
//! Enumerates audio input devices and records the microphone into a WAV
//! artifact via cpal. Samples accumulate in a shared buffer from the
//! device callback and are flushed to disk on a one-second cadence.

use crate::capture::traits::AudioDeviceInfo;
use crate::recorder::channel::{ChannelKind, RecordingChannel, RecordingError, RecordingResult};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat};
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};
use parking_lot::Mutex;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often buffered samples are flushed to the WAV artifact
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Get list of available audio input devices (microphones)
pub fn get_audio_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();

    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    let Ok(devices) = host.input_devices() else {
        tracing::warn!("Failed to enumerate audio input devices");
        return Vec::new();
    };

    devices
        .filter_map(|device| {
            let name = device.name().ok()?;
            Some(AudioDeviceInfo {
                id: name.clone(),
                name: name.clone(),
                is_input: true,
                is_default: Some(&name) == default_name.as_ref(),
            })
        })
        .collect()
}

/// Resolve an input device by ID, falling back to the default device
fn resolve_input_device(device_id: Option<&str>) -> RecordingResult<Device> {
    let host = cpal::default_host();

    if let Some(id) = device_id {
        let devices = host.input_devices().map_err(|e| {
            RecordingError::DeviceNotFound(format!("Failed to enumerate input devices: {}", e))
        })?;

        for device in devices {
            if device.name().map(|n| n == id).unwrap_or(false) {
                return Ok(device);
            }
        }

        tracing::warn!("Microphone '{}' not found, falling back to default", id);
    }

    host.default_input_device().ok_or_else(|| {
        RecordingError::DeviceNotFound(
            "No microphone found. Please connect a microphone and try again.".to_string(),
        )
    })
}

/// Shared PCM accumulation buffer with a live enabled flag.
///
/// The device callback pushes into it; the flush task drains it. While
/// the track is disabled (muted) the same number of samples is written
/// as silence, so the track length always matches the recording.
pub struct TrackBuffer {
    samples: Mutex<Vec<i16>>,
    enabled: AtomicBool,
}

impl TrackBuffer {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// Append samples from the device callback
    pub fn push(&self, samples: &[i16]) {
        let mut guard = self.samples.lock();
        if self.enabled.load(Ordering::Relaxed) {
            guard.extend_from_slice(samples);
        } else {
            guard.extend(std::iter::repeat(0).take(samples.len()));
        }
    }

    /// Take everything accumulated so far
    pub fn drain(&self) -> Vec<i16> {
        std::mem::take(&mut *self.samples.lock())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for TrackBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// WAV writer shared between the flush task and the channel
pub type SharedWavWriter = Arc<Mutex<Option<WavWriter<BufWriter<File>>>>>;

/// Drain the buffer into the WAV writer
pub fn flush_samples(buffer: &TrackBuffer, writer: &SharedWavWriter) {
    let samples = buffer.drain();
    if samples.is_empty() {
        return;
    }

    let mut guard = writer.lock();
    if let Some(ref mut writer) = *guard {
        for sample in samples {
            if writer.write_sample(sample).is_err() {
                tracing::warn!("Failed to write audio samples to artifact");
                break;
            }
        }
    }
}

/// Run a cpal input stream on a dedicated thread until `is_recording`
/// clears. cpal streams are not Send, so they cannot live in an async
/// task.
fn run_input_stream(
    device: Device,
    buffer: Arc<TrackBuffer>,
    is_recording: Arc<AtomicBool>,
) -> RecordingResult<(std::thread::JoinHandle<()>, WavSpec)> {
    let config = device.default_input_config().map_err(|e| {
        RecordingError::DeviceNotFound(format!("Failed to read input config: {}", e))
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
        let err_fn = |e| tracing::warn!("Audio stream error: {}", e);

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
            SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                {
                    let buffer = buffer.clone();
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|&s| (s as i32 - i16::MAX as i32 - 1) as i16)
                            .collect();
                        buffer.push(&converted);
                    }
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
                tracing::error!("Failed to build input stream: {}", e);
                return;
            }
        };

        if let Err(e) = stream.play() {
            tracing::error!("Failed to start input stream: {}", e);
            return;
        }

        while is_recording.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }

        drop(stream);
    });

    Ok((handle, spec))
}

/// Microphone capture channel
pub struct MicrophoneCaptureChannel {
    id: String,
    device_id: Option<String>,
    is_recording: Arc<AtomicBool>,
    buffer: Arc<TrackBuffer>,
    writer: SharedWavWriter,
    artifact_path: Option<PathBuf>,
    stream_thread: Option<std::thread::JoinHandle<()>>,
    flush_task: Option<tokio::task::JoinHandle<()>>,
}

impl MicrophoneCaptureChannel {
    /// Create a new microphone capture channel
    pub fn new(device_id: Option<String>) -> Self {
        Self {
            id: "microphone".to_string(),
            device_id,
            is_recording: Arc::new(AtomicBool::new(false)),
            buffer: Arc::new(TrackBuffer::new()),
            writer: Arc::new(Mutex::new(None)),
            artifact_path: None,
            stream_thread: None,
            flush_task: None,
        }
    }
}

#[async_trait]
impl RecordingChannel for MicrophoneCaptureChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Microphone
    }

    async fn initialize(&mut self, artifact_dir: &Path) -> RecordingResult<()> {
        // Resolve the device up front so a missing microphone fails the
        // start, not the capture thread.
        resolve_input_device(self.device_id.as_deref())?;

        self.artifact_path = Some(artifact_dir.join("microphone.wav"));

        tracing::info!(
            "Microphone channel initialized (device: {})",
            self.device_id.as_deref().unwrap_or("default")
        );
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

        let device = resolve_input_device(self.device_id.as_deref())?;

        self.is_recording.store(true, Ordering::SeqCst);
        self.buffer.set_enabled(true);

        let (handle, spec) =
            run_input_stream(device, self.buffer.clone(), self.is_recording.clone())?;
        self.stream_thread = Some(handle);

        let writer = WavWriter::create(&artifact_path, spec).map_err(|e| {
            RecordingError::Configuration(format!("Failed to create {:?}: {}", artifact_path, e))
        })?;
        *self.writer.lock() = Some(writer);

        // Periodic flush keeps the artifact growing during long sessions
        let buffer = self.buffer.clone();
        let shared_writer = self.writer.clone();
        let is_recording = self.is_recording.clone();
        self.flush_task = Some(tokio::spawn(async move {
            while is_recording.load(Ordering::SeqCst) {
                tokio::time::sleep(FLUSH_INTERVAL).await;
                flush_samples(&buffer, &shared_writer);
            }
        }));

        tracing::info!("Microphone capture started");
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

        // Final drain after the stream thread is gone
        flush_samples(&self.buffer, &self.writer);

        if let Some(writer) = self.writer.lock().take() {
            writer.finalize().map_err(|e| {
                RecordingError::Configuration(format!("Failed to finalize WAV artifact: {}", e))
            })?;
        }

        tracing::info!("Microphone capture stopped");
        Ok(())
    }

    fn set_track_enabled(&mut self, enabled: bool) {
        self.buffer.set_enabled(enabled);
        tracing::debug!("Microphone track enabled: {}", enabled);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_buffer_accumulates() {
        let buffer = TrackBuffer::new();

        buffer.push(&[1, 2, 3]);
        buffer.push(&[4, 5]);

        assert_eq!(buffer.drain(), vec![1, 2, 3, 4, 5]);
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_track_buffer_writes_silence_while_disabled() {
        let buffer = TrackBuffer::new();

        buffer.push(&[10, 20]);
        buffer.set_enabled(false);
        buffer.push(&[30, 40, 50]);
        buffer.set_enabled(true);
        buffer.push(&[60]);

        // Muted interval keeps its length but carries silence
        assert_eq!(buffer.drain(), vec![10, 20, 0, 0, 0, 60]);
    }
}
