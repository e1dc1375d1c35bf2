//! Upload command handlers
//!
//! The upload runs as a background task: the command returns
//! immediately, progress is observable via `is_uploading`, and the
//! terminal status lands in the store and an event.

use super::auth::StoreState;
use super::recording::RecorderState;
use crate::store::history::{RecordingRecord, STATUS_FAILED, STATUS_UPLOADED};
use crate::store::Store;
use crate::upload::{RecordingsApiClient, UploadError, UploadOutcome, Uploader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

/// Default recordings API endpoint
const DEFAULT_API_BASE_URL: &str = "https://api-dev-classcapsule.nfndev.com";

fn api_base_url() -> String {
    std::env::var("CAPMEET_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string())
}

fn downloads_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(std::env::temp_dir)
}

/// State for tracking the in-flight upload
#[derive(Default)]
pub struct UploadState {
    /// Whether an upload is currently running
    is_uploading: Arc<AtomicBool>,
}

/// Upload the last completed recording in the background.
///
/// Emits `upload-complete` or `upload-failed` when the task resolves.
/// There is no cancellation: an in-flight upload runs to completion.
#[tauri::command]
pub async fn upload_recording(
    app: AppHandle,
    recorder: State<'_, RecorderState>,
    upload: State<'_, UploadState>,
    store_state: State<'_, StoreState>,
) -> Result<(), String> {
    if upload.is_uploading.load(Ordering::Relaxed) {
        return Err("An upload is already in progress".to_string());
    }

    let blob = recorder
        .pending
        .lock()
        .await
        .take()
        .ok_or_else(|| "No recording ready for upload".to_string())?;

    upload.is_uploading.store(true, Ordering::Relaxed);

    let is_uploading = upload.is_uploading.clone();
    let store = store_state.store.clone();

    tracing::info!("Starting background upload of {}", blob.filename);

    tauri::async_runtime::spawn(async move {
        run_upload(&app, &store, blob).await;
        is_uploading.store(false, Ordering::Relaxed);
    });

    Ok(())
}

async fn run_upload(app: &AppHandle, store: &Store, blob: crate::recorder::RecordedBlob) {
    let token = match store.auth_token() {
        Ok(Some(token)) => token,
        _ => {
            // No point talking to the API without a token; go straight
            // to the local fallback.
            tracing::warn!("No authentication token available, saving recording locally");
            let path = save_fallback(&blob);
            record_failure(store, &blob, path.as_deref());
            emit_failed(
                app,
                "No authentication token available. Please login first.",
            );
            return;
        }
    };

    let api = Arc::new(RecordingsApiClient::new(&api_base_url(), token));
    let uploader = Uploader::new(api, downloads_dir());

    match uploader.upload(&blob).await {
        Ok(UploadOutcome::Uploaded { .. }) => {
            let record = RecordingRecord::new(
                &blob.filename,
                &blob.path.to_string_lossy(),
                blob.data.len() as u64,
                STATUS_UPLOADED,
            );
            if let Err(e) = store.record_uploaded(record) {
                tracing::warn!("Failed to persist upload record: {}", e);
            }

            if let Err(e) = app.emit("upload-complete", &blob.filename) {
                tracing::warn!("Failed to emit upload-complete: {}", e);
            }
        }
        Ok(UploadOutcome::SavedLocally { path, error }) => {
            if matches!(error, UploadError::NotAuthenticated) {
                // Expired token: force the next launch through login
                if let Err(e) = store.clear_auth_token() {
                    tracing::warn!("Failed to clear auth token: {}", e);
                }
            }

            record_failure(store, &blob, Some(&path));
            emit_failed(app, &error.to_string());
        }
        Err(error) => {
            // Even the local save failed; keep the failure visible
            tracing::error!("Upload and local fallback both failed: {}", error);
            record_failure(store, &blob, None);
            emit_failed(app, &error.to_string());
        }
    }
}

fn save_fallback(blob: &crate::recorder::RecordedBlob) -> Option<PathBuf> {
    let dir = downloads_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::error!("Failed to create downloads dir: {}", e);
        return None;
    }

    let path = dir.join(&blob.filename);
    match std::fs::write(&path, &blob.data) {
        Ok(()) => {
            tracing::info!("Recording saved locally: {:?}", path);
            Some(path)
        }
        Err(e) => {
            tracing::error!("Failed to save recording locally: {}", e);
            None
        }
    }
}

fn record_failure(
    store: &Store,
    blob: &crate::recorder::RecordedBlob,
    local_path: Option<&std::path::Path>,
) {
    let file_path = local_path
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| blob.path.to_string_lossy().to_string());

    let record = RecordingRecord::new(
        &blob.filename,
        &file_path,
        blob.data.len() as u64,
        STATUS_FAILED,
    );

    if let Err(e) = store.record_failed_upload(record) {
        tracing::warn!("Failed to persist failure record: {}", e);
    }
}

fn emit_failed(app: &AppHandle, message: &str) {
    if let Err(e) = app.emit("upload-failed", message) {
        tracing::warn!("Failed to emit upload-failed: {}", e);
    }
}

/// Check if an upload is currently in progress
#[tauri::command]
pub fn is_uploading(state: State<'_, UploadState>) -> bool {
    state.is_uploading.load(Ordering::Relaxed)
}

/// The latest recording's upload status, for the recordings card
#[tauri::command]
pub async fn get_latest_recording_status(
    state: State<'_, StoreState>,
) -> Result<Option<RecordingRecord>, String> {
    state.store.latest_recording().map_err(|e| e.to_string())
}

/// Recordings that failed to upload and were saved locally
#[tauri::command]
pub async fn list_failed_uploads(
    state: State<'_, StoreState>,
) -> Result<Vec<RecordingRecord>, String> {
    state.store.failed_uploads().map_err(|e| e.to_string())
}

/// Drop all upload history
#[tauri::command]
pub async fn clear_upload_history(state: State<'_, StoreState>) -> Result<(), String> {
    state.store.clear_upload_history().map_err(|e| e.to_string())
}
