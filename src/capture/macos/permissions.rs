//! macOS permission handling
//!
//! Handles screen recording and microphone permissions on macOS.

use core_graphics::access::ScreenCaptureAccess;

/// Check if screen recording permission is granted
pub fn has_screen_recording_permission() -> bool {
    ScreenCaptureAccess::preflight()
}

/// Request screen recording permission
///
/// This will prompt the user to grant permission if not already granted.
/// Returns true if permission was already granted, false otherwise.
/// Note: The actual permission dialog is shown by the system.
pub fn request_screen_recording_permission() -> bool {
    ScreenCaptureAccess::request()
}

/// Check if microphone access is possible.
///
/// The microphone consent dialog is raised by the system the first time
/// an input stream is opened; the only state detectable beforehand is
/// whether an input device exists at all.
pub fn has_microphone_permission() -> bool {
    use cpal::traits::HostTrait;
    cpal::default_host().default_input_device().is_some()
}

/// Request microphone permission
pub fn request_microphone_permission() -> bool {
    has_microphone_permission()
}

/// Open System Preferences to the Screen Recording pane
pub fn open_screen_recording_preferences() {
    let url = "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture";
    if let Ok(output) = std::process::Command::new("open").arg(url).output() {
        if !output.status.success() {
            tracing::warn!("Failed to open Screen Recording preferences");
        }
    }
}

/// Open System Preferences to the Microphone pane
pub fn open_microphone_preferences() {
    let url = "x-apple.systempreferences:com.apple.preference.security?Privacy_Microphone";
    if let Ok(output) = std::process::Command::new("open").arg(url).output() {
        if !output.status.success() {
            tracing::warn!("Failed to open Microphone preferences");
        }
    }
}
