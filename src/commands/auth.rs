//! Authentication commands
//!
//! The auth token is obtained by the login UI and kept client-side; the
//! upload flow reads it from here.

use crate::store::Store;
use tauri::State;

/// Application state wrapping the persistent store
pub struct StoreState {
    pub store: Store,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            store: Store::new(Store::default_dir()),
        }
    }
}

/// Persist the auth token after login
#[tauri::command]
pub async fn set_auth_token(state: State<'_, StoreState>, token: String) -> Result<(), String> {
    state
        .store
        .set_auth_token(&token)
        .map_err(|e| e.to_string())
}

/// Get the stored auth token
#[tauri::command]
pub async fn get_auth_token(state: State<'_, StoreState>) -> Result<Option<String>, String> {
    state.store.auth_token().map_err(|e| e.to_string())
}

/// Forget the auth token (logout)
#[tauri::command]
pub async fn clear_auth_token(state: State<'_, StoreState>) -> Result<(), String> {
    state.store.clear_auth_token().map_err(|e| e.to_string())
}

/// Whether a token is stored
#[tauri::command]
pub async fn is_authenticated(state: State<'_, StoreState>) -> Result<bool, String> {
    Ok(state
        .store
        .auth_token()
        .map_err(|e| e.to_string())?
        .is_some())
}
