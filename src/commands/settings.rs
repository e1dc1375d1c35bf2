//! Preference commands

use super::auth::StoreState;
use crate::store::settings::Preferences;
use tauri::State;

/// Load the user's capture preferences
#[tauri::command]
pub async fn get_preferences(state: State<'_, StoreState>) -> Result<Preferences, String> {
    state.store.preferences().map_err(|e| e.to_string())
}

/// Persist the user's capture preferences
#[tauri::command]
pub async fn set_preferences(
    state: State<'_, StoreState>,
    preferences: Preferences,
) -> Result<(), String> {
    state
        .store
        .set_preferences(&preferences)
        .map_err(|e| e.to_string())
}
