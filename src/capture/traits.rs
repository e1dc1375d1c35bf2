//! Capture trait definitions
//!
//! Platform-agnostic types for capture sources and devices.

use serde::{Deserialize, Serialize};

/// Kind of capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A whole display
    Screen,
    /// A single application window
    Window,
}

/// An enumerable screen or window available for capture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSourceInfo {
    /// Unique source ID (`screen:<display-id>` or `window:<window-id>`)
    pub id: String,

    /// Human-readable name (display name or window title)
    pub name: String,

    /// Screen or window
    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// Base64-encoded PNG thumbnail, if one could be captured
    pub thumbnail: Option<String>,
}

/// Information about a display/screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Unique display ID
    pub id: u32,

    /// Display name
    pub name: String,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Scale factor (e.g., 2.0 for Retina)
    pub scale_factor: f64,

    /// Whether this is the primary display
    pub is_primary: bool,

    /// Refresh rate in Hz, if the platform reports one
    pub refresh_rate: Option<u32>,
}

/// Information about a capture window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Unique window ID
    pub id: u32,

    /// Window title
    pub title: String,

    /// Application name
    pub app_name: String,
}

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Whether this is an input device
    pub is_input: bool,

    /// Whether this is the default device
    pub is_default: bool,
}

/// Check if screen recording permission is granted
pub fn has_screen_recording_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        crate::capture::macos::permissions::has_screen_recording_permission()
    }

    #[cfg(target_os = "windows")]
    {
        // Windows doesn't require explicit permission for screen capture
        true
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        false
    }
}

/// Request screen recording permission
pub fn request_screen_recording_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        crate::capture::macos::permissions::request_screen_recording_permission()
    }

    #[cfg(target_os = "windows")]
    {
        true
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        false
    }
}

/// Check if microphone permission is granted
pub fn has_microphone_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        crate::capture::macos::permissions::has_microphone_permission()
    }

    #[cfg(not(target_os = "macos"))]
    {
        // Other platforms handle microphone permission at stream-open time
        true
    }
}

/// Request microphone permission
pub fn request_microphone_permission() -> bool {
    #[cfg(target_os = "macos")]
    {
        crate::capture::macos::permissions::request_microphone_permission()
    }

    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_source_wire_format() {
        let source = CaptureSourceInfo {
            id: "screen:1".to_string(),
            name: "Main Display".to_string(),
            kind: SourceKind::Screen,
            thumbnail: None,
        };

        let json = serde_json::to_value(&source).unwrap();

        assert_eq!(json["id"], "screen:1");
        assert_eq!(json["type"], "screen");
        assert!(json["thumbnail"].is_null());
    }
}
