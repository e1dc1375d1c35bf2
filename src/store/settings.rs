//! User preferences
//!
//! The selected capture source and audio device choices, persisted
//! between sessions.

use super::{Store, StoreResult};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "settings.json";

/// Capture preferences chosen in the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Preferred capture source (`screen:<id>` / `window:<id>`)
    pub selected_source_id: Option<String>,

    /// Preferred microphone device
    pub microphone_device_id: Option<String>,

    /// Whether the microphone is enabled
    pub microphone_enabled: bool,

    /// Whether system audio is enabled
    pub system_audio_enabled: bool,

    /// Record audio only
    pub audio_only: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_source_id: None,
            microphone_device_id: None,
            microphone_enabled: true,
            system_audio_enabled: true,
            audio_only: false,
        }
    }
}

impl Store {
    /// Load preferences, defaulting when nothing was saved yet
    pub fn preferences(&self) -> StoreResult<Preferences> {
        Ok(self.read_json(SETTINGS_FILE)?.unwrap_or_default())
    }

    /// Persist preferences
    pub fn set_preferences(&self, preferences: &Preferences) -> StoreResult<()> {
        self.write_json(SETTINGS_FILE, preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_preferences_default_when_missing() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        let prefs = store.preferences().unwrap();

        assert!(prefs.microphone_enabled);
        assert!(prefs.system_audio_enabled);
        assert!(!prefs.audio_only);
        assert!(prefs.selected_source_id.is_none());
    }

    #[test]
    fn test_preferences_round_trip() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        let prefs = Preferences {
            selected_source_id: Some("screen:1".to_string()),
            microphone_device_id: Some("Built-in Microphone".to_string()),
            microphone_enabled: false,
            system_audio_enabled: true,
            audio_only: true,
        };

        store.set_preferences(&prefs).unwrap();
        let loaded = store.preferences().unwrap();

        assert_eq!(loaded.selected_source_id.as_deref(), Some("screen:1"));
        assert!(!loaded.microphone_enabled);
        assert!(loaded.audio_only);
    }
}
