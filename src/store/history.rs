//! Upload history
//!
//! Tracks the latest recording's upload status and the list of
//! recordings that had to be saved locally, for later display.

use super::{Store, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const HISTORY_FILE: &str = "history.json";

/// Status shown for a recording that could not be uploaded
pub const STATUS_FAILED: &str = "Failed to upload";

/// Status shown for a successfully uploaded recording
pub const STATUS_UPLOADED: &str = "Uploaded";

/// One recording's upload record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRecord {
    /// Generated recording filename
    pub filename: String,

    /// Where the file lives (locally saved or pre-upload path)
    pub file_path: String,

    /// Size in bytes
    pub file_size_bytes: u64,

    /// Size in megabytes, for display
    pub file_size_mb: f64,

    /// `Uploaded` or `Failed to upload`
    pub status: String,

    /// When the recording finished
    pub started_at: DateTime<Utc>,
}

impl RecordingRecord {
    /// Build a record for a recording of `size_bytes` at `file_path`
    pub fn new(filename: &str, file_path: &str, size_bytes: u64, status: &str) -> Self {
        Self {
            filename: filename.to_string(),
            file_path: file_path.to_string(),
            file_size_bytes: size_bytes,
            file_size_mb: size_bytes as f64 / 1024.0 / 1024.0,
            status: status.to_string(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadHistory {
    latest: Option<RecordingRecord>,
    failed: Vec<RecordingRecord>,
}

impl Store {
    fn history(&self) -> StoreResult<UploadHistory> {
        Ok(self.read_json(HISTORY_FILE)?.unwrap_or_default())
    }

    /// The latest recording's record, if any
    pub fn latest_recording(&self) -> StoreResult<Option<RecordingRecord>> {
        Ok(self.history()?.latest)
    }

    /// Record a successful upload
    pub fn record_uploaded(&self, record: RecordingRecord) -> StoreResult<()> {
        let mut history = self.history()?;
        history.latest = Some(record);
        self.write_json(HISTORY_FILE, &history)
    }

    /// Record a failed upload that was saved locally
    pub fn record_failed_upload(&self, record: RecordingRecord) -> StoreResult<()> {
        let mut history = self.history()?;
        history.latest = Some(record.clone());
        history.failed.push(record);
        self.write_json(HISTORY_FILE, &history)
    }

    /// Recordings that had to be saved locally
    pub fn failed_uploads(&self) -> StoreResult<Vec<RecordingRecord>> {
        Ok(self.history()?.failed)
    }

    /// Drop all upload history
    pub fn clear_upload_history(&self) -> StoreResult<()> {
        self.remove(HISTORY_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_failed_upload_is_recorded() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        let record = RecordingRecord::new(
            "recording-1700000000000.webm",
            "/downloads/recording-1700000000000.webm",
            2 * 1024 * 1024,
            STATUS_FAILED,
        );
        store.record_failed_upload(record).unwrap();

        let latest = store.latest_recording().unwrap().unwrap();
        assert_eq!(latest.status, STATUS_FAILED);
        assert_eq!(latest.file_size_mb, 2.0);

        let failed = store.failed_uploads().unwrap();
        assert_eq!(failed.len(), 1);
    }

    #[test]
    fn test_uploaded_does_not_join_failed_list() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        let record = RecordingRecord::new(
            "recording-1700000000001.webm",
            "/tmp/recording-1700000000001.webm",
            1024,
            STATUS_UPLOADED,
        );
        store.record_uploaded(record).unwrap();

        assert_eq!(
            store.latest_recording().unwrap().unwrap().status,
            STATUS_UPLOADED
        );
        assert!(store.failed_uploads().unwrap().is_empty());
    }

    #[test]
    fn test_clear_upload_history() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path().to_path_buf());

        store
            .record_failed_upload(RecordingRecord::new("a.webm", "/a.webm", 1, STATUS_FAILED))
            .unwrap();
        store.clear_upload_history().unwrap();

        assert!(store.latest_recording().unwrap().is_none());
        assert!(store.failed_uploads().unwrap().is_empty());
    }
}
