//! Client-side persistence
//!
//! Small JSON files under the app config directory hold the auth token,
//! the user's device/source preferences, and the upload history. Writes
//! go to disk immediately.

pub mod history;
pub mod settings;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Store-related errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

const AUTH_FILE: &str = "auth.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthRecord {
    auth_token: String,
}

/// File-backed key-value store for app state
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Create a store rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// The default store location under the platform config directory
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("CapMeet")
    }

    /// Read and parse a JSON file; absent files read as None
    pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
    ) -> StoreResult<Option<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Serialize and write a JSON file immediately
    pub(crate) fn write_json<T: Serialize>(&self, file: &str, value: &T) -> StoreResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(self.dir.join(file), content)?;

        Ok(())
    }

    /// Delete a file if present
    pub(crate) fn remove(&self, file: &str) -> StoreResult<()> {
        let path = self.dir.join(file);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// The stored auth token, if the user is logged in
    pub fn auth_token(&self) -> StoreResult<Option<String>> {
        Ok(self
            .read_json::<AuthRecord>(AUTH_FILE)?
            .map(|r| r.auth_token))
    }

    /// Persist the auth token
    pub fn set_auth_token(&self, token: &str) -> StoreResult<()> {
        self.write_json(
            AUTH_FILE,
            &AuthRecord {
                auth_token: token.to_string(),
            },
        )
    }

    /// Forget the auth token (logout, expired token)
    pub fn clear_auth_token(&self) -> StoreResult<()> {
        self.remove(AUTH_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_auth_token_round_trip() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        assert!(store.auth_token().unwrap().is_none());

        store.set_auth_token("tok-123").unwrap();
        assert_eq!(store.auth_token().unwrap().as_deref(), Some("tok-123"));

        store.clear_auth_token().unwrap();
        assert!(store.auth_token().unwrap().is_none());
    }

    #[test]
    fn test_clear_missing_token_is_ok() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        store.clear_auth_token().unwrap();
    }
}
