//! macOS system audio capture
//!
//! System audio on macOS needs ScreenCaptureKit (macOS 13+) or a
//! virtual loopback device; neither is wired up yet, so availability is
//! reported as false and the coordinator records without a system track.
//! The UI reflects this through `check_system_audio_available`.

/// Check if system audio capture is available
pub fn is_system_audio_available() -> bool {
    false
}
