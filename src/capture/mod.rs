//! Platform-specific capture implementations
//!
//! This module provides capture source enumeration and the screen and
//! audio capture channels for each platform.

pub mod audio;
pub mod encoder;
pub mod thumbnail;
pub mod traits;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

// Re-export traits
pub use traits::{AudioDeviceInfo, CaptureSourceInfo, DisplayInfo, SourceKind, WindowInfo};

// Re-export permission functions from traits (which delegates to platform)
pub use traits::{
    has_microphone_permission, has_screen_recording_permission, request_microphone_permission,
    request_screen_recording_permission,
};

/// A resolved capture target parsed from a source ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// Capture a whole display
    Screen(u32),
    /// Capture a single window
    Window(u32),
}

impl CaptureTarget {
    /// Parse a source ID of the form `screen:<id>` or `window:<id>`
    pub fn parse(source_id: &str) -> Option<Self> {
        let (kind, raw_id) = source_id.split_once(':')?;
        let id = raw_id.parse().ok()?;
        match kind {
            "screen" => Some(CaptureTarget::Screen(id)),
            "window" => Some(CaptureTarget::Window(id)),
            _ => None,
        }
    }

    /// The source ID string for this target
    pub fn source_id(&self) -> String {
        match self {
            CaptureTarget::Screen(id) => format!("screen:{id}"),
            CaptureTarget::Window(id) => format!("window:{id}"),
        }
    }
}

/// Get the list of capture sources (screens and windows) with thumbnails
pub fn get_capture_sources() -> Vec<CaptureSourceInfo> {
    #[cfg(target_os = "macos")]
    {
        macos::screen::get_capture_sources()
    }

    #[cfg(target_os = "windows")]
    {
        windows::screen::get_capture_sources()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// Get the list of available displays
pub fn get_displays() -> Vec<DisplayInfo> {
    #[cfg(target_os = "macos")]
    {
        macos::screen::get_displays()
    }

    #[cfg(target_os = "windows")]
    {
        windows::screen::get_displays()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

/// Check if system audio capture is available on this machine
pub fn is_system_audio_available() -> bool {
    #[cfg(target_os = "macos")]
    {
        macos::system_audio::is_system_audio_available()
    }

    #[cfg(target_os = "windows")]
    {
        windows::system_audio::is_system_audio_available()
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_screen_source_id() {
        assert_eq!(CaptureTarget::parse("screen:3"), Some(CaptureTarget::Screen(3)));
        assert_eq!(CaptureTarget::parse("window:42"), Some(CaptureTarget::Window(42)));
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert_eq!(CaptureTarget::parse("camera:1"), None);
        assert_eq!(CaptureTarget::parse("screen:abc"), None);
        assert_eq!(CaptureTarget::parse("screen"), None);
    }

    #[test]
    fn test_source_id_round_trip() {
        let target = CaptureTarget::Window(7);
        assert_eq!(CaptureTarget::parse(&target.source_id()), Some(target));
    }
}
