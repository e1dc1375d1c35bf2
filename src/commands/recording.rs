//! Recording-related Tauri commands

use crate::capture::audio::get_audio_input_devices;
use crate::capture::traits::{
    has_screen_recording_permission, request_screen_recording_permission, AudioDeviceInfo,
    CaptureSourceInfo, DisplayInfo,
};
use crate::capture::CaptureTarget;
use crate::recorder::state::{RecordedBlob, RecordingConfig, RecordingOutput, RecordingState};
use crate::recorder::RecordingCoordinator;
use crate::utils::error::{AppError, ErrorResponse};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};
use tokio::sync::Mutex;

/// Application state for recording
pub struct RecorderState {
    pub coordinator: Arc<Mutex<RecordingCoordinator>>,

    /// The last completed recording, held until the upload consumes it
    pub pending: Arc<Mutex<Option<RecordedBlob>>>,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            coordinator: Arc::new(Mutex::new(RecordingCoordinator::new())),
            pending: Arc::new(Mutex::new(None)),
        }
    }
}

/// Get the list of capture sources (screens and windows)
#[tauri::command]
pub async fn get_capture_sources() -> Result<Vec<CaptureSourceInfo>, String> {
    Ok(crate::capture::get_capture_sources())
}

/// Get list of available displays
#[tauri::command]
pub async fn get_displays() -> Result<Vec<DisplayInfo>, String> {
    Ok(crate::capture::get_displays())
}

/// Get list of available audio input devices (microphones)
#[tauri::command]
pub async fn get_audio_devices() -> Result<Vec<AudioDeviceInfo>, String> {
    Ok(get_audio_input_devices())
}

/// Check if microphone permission is granted
#[tauri::command]
pub async fn check_microphone_permission() -> Result<bool, String> {
    Ok(crate::capture::traits::has_microphone_permission())
}

/// Request microphone permission
#[tauri::command]
pub async fn request_microphone_permission() -> Result<bool, String> {
    Ok(crate::capture::traits::request_microphone_permission())
}

/// Check if screen recording permission is granted
#[tauri::command]
pub async fn check_screen_permission() -> Result<bool, String> {
    Ok(has_screen_recording_permission())
}

/// Request screen recording permission
#[tauri::command]
pub async fn request_screen_permission() -> Result<bool, String> {
    Ok(request_screen_recording_permission())
}

/// Check if system audio capture is available
#[tauri::command]
pub async fn check_system_audio_available() -> Result<bool, String> {
    Ok(crate::capture::is_system_audio_available())
}

/// Open the OS settings pane for the given permission (`screen` or
/// `microphone`), so the user can grant access after a denial.
#[tauri::command]
pub async fn open_permission_settings(permission: String) -> Result<(), String> {
    #[cfg(target_os = "macos")]
    match permission.as_str() {
        "screen" => crate::capture::macos::permissions::open_screen_recording_preferences(),
        "microphone" => crate::capture::macos::permissions::open_microphone_preferences(),
        other => return Err(format!("Unknown permission: {}", other)),
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = permission;
    }

    Ok(())
}

/// Pick the capture target: the preferred source when it still exists,
/// otherwise the first available one.
fn resolve_capture_target(
    preferred: Option<&str>,
    sources: &[CaptureSourceInfo],
) -> Result<CaptureTarget, String> {
    if let Some(preferred) = preferred {
        if sources.iter().any(|s| s.id == preferred) {
            if let Some(target) = CaptureTarget::parse(preferred) {
                return Ok(target);
            }
        }
        tracing::warn!(
            "Selected source '{}' not found, falling back to first available source",
            preferred
        );
    }

    sources
        .first()
        .and_then(|s| CaptureTarget::parse(&s.id))
        .ok_or_else(|| "No screen sources available".to_string())
}

/// Start recording
#[tauri::command]
pub async fn start_recording(
    state: State<'_, RecorderState>,
    config: RecordingConfig,
) -> Result<(), ErrorResponse> {
    let mut coordinator = state.coordinator.lock().await;

    coordinator.clear_channels();

    if !config.audio_only {
        // Screen capture needs permission before anything is assembled
        if !has_screen_recording_permission() {
            request_screen_recording_permission();
            return Err(AppError::PermissionDenied(
                "Screen recording permission not granted. Please allow in System Preferences and try again."
                    .to_string(),
            )
            .into());
        }

        let sources = crate::capture::get_capture_sources();
        let target = resolve_capture_target(config.source_id.as_deref(), &sources)
            .map_err(|e| ErrorResponse::from(AppError::DeviceNotFound(e)))?;

        #[cfg(target_os = "macos")]
        {
            let channel = Box::new(crate::capture::macos::screen::ScreenCaptureChannel::new(
                target,
            ));
            coordinator.add_channel(channel);
        }

        #[cfg(target_os = "windows")]
        {
            let channel = Box::new(crate::capture::windows::screen::ScreenCaptureChannel::new(
                target,
            ));
            coordinator.add_channel(channel);
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let _ = target;
            return Err(AppError::Recording(
                "Screen capture is not supported on this platform".to_string(),
            )
            .into());
        }
    }

    if config.capture_microphone {
        let channel = Box::new(crate::capture::audio::MicrophoneCaptureChannel::new(
            config.microphone_device_id.clone(),
        ));
        coordinator.add_channel(channel);
    }

    if config.capture_system_audio {
        if crate::capture::is_system_audio_available() {
            #[cfg(target_os = "windows")]
            {
                let channel =
                    Box::new(crate::capture::windows::system_audio::SystemAudioCaptureChannel::new());
                coordinator.add_channel(channel);
            }
        } else {
            // Recording proceeds with whatever sources remain
            tracing::warn!("System audio capture requested but not available");
        }
    }

    coordinator
        .start(&config)
        .await
        .map_err(|e| ErrorResponse::from(AppError::from(e)))
}

/// Stop recording. The finished blob is held for the upload flow and a
/// summary returned to the frontend.
#[tauri::command]
pub async fn stop_recording(
    state: State<'_, RecorderState>,
) -> Result<RecordingOutput, ErrorResponse> {
    let blob = {
        let mut coordinator = state.coordinator.lock().await;
        coordinator
            .stop()
            .await
            .map_err(|e| ErrorResponse::from(AppError::from(e)))?
    };

    let output = RecordingOutput::from(&blob);
    *state.pending.lock().await = Some(blob);

    Ok(output)
}

/// Get current recording state
#[tauri::command]
pub async fn get_recording_state(
    state: State<'_, RecorderState>,
) -> Result<RecordingState, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.state())
}

/// Get current recording duration in milliseconds
#[tauri::command]
pub async fn get_recording_duration(state: State<'_, RecorderState>) -> Result<f64, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.duration_ms())
}

/// Mute or unmute the microphone. The new state is broadcast so every
/// window (toolbar, overlay) stays in sync.
#[tauri::command]
pub async fn toggle_microphone_mute(
    app: AppHandle,
    state: State<'_, RecorderState>,
    muted: bool,
) -> Result<bool, String> {
    let mut coordinator = state.coordinator.lock().await;
    coordinator.set_microphone_muted(muted);

    if let Err(e) = app.emit("microphone-mute-toggled", muted) {
        tracing::warn!("Failed to broadcast mute state: {}", e);
    }

    Ok(muted)
}

/// Get the current microphone mute state
#[tauri::command]
pub async fn get_microphone_mute(state: State<'_, RecorderState>) -> Result<bool, String> {
    let coordinator = state.coordinator.lock().await;
    Ok(coordinator.is_microphone_muted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::traits::SourceKind;

    fn sources() -> Vec<CaptureSourceInfo> {
        vec![
            CaptureSourceInfo {
                id: "screen:1".to_string(),
                name: "Main Display".to_string(),
                kind: SourceKind::Screen,
                thumbnail: None,
            },
            CaptureSourceInfo {
                id: "window:42".to_string(),
                name: "Browser".to_string(),
                kind: SourceKind::Window,
                thumbnail: None,
            },
        ]
    }

    #[test]
    fn test_resolve_prefers_selected_source() {
        let target = resolve_capture_target(Some("window:42"), &sources()).unwrap();
        assert_eq!(target, CaptureTarget::Window(42));
    }

    #[test]
    fn test_resolve_falls_back_to_first_source() {
        let target = resolve_capture_target(Some("screen:99"), &sources()).unwrap();
        assert_eq!(target, CaptureTarget::Screen(1));
    }

    #[test]
    fn test_resolve_without_preference_uses_first() {
        let target = resolve_capture_target(None, &sources()).unwrap();
        assert_eq!(target, CaptureTarget::Screen(1));
    }

    #[test]
    fn test_resolve_errors_with_no_sources() {
        assert!(resolve_capture_target(None, &[]).is_err());
    }
}
