//! Upload orchestration
//!
//! Decides between the single-call and multipart paths, splits the blob
//! across the presigned URLs, retries each part a bounded number of
//! times with exponential backoff, and falls back to a local save
//! exactly once when the upload cannot complete.

use super::client::RecordingsApi;
use super::error::UploadError;
use super::types::{order_parts, CompletedPart, UploadReceipt};
use crate::recorder::RecordedBlob;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tuning knobs for the upload flow
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Files under this take the single-call path
    pub small_file_cutoff: u64,

    /// A failed multipart upload under this size is retried once via the
    /// single-call path
    pub single_call_fallback_cutoff: u64,

    /// Attempts per part, including the first
    pub max_part_attempts: u32,

    /// Base delay for the exponential backoff between part attempts
    pub retry_base_delay: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            small_file_cutoff: 10 * 1024 * 1024,
            single_call_fallback_cutoff: 15 * 1024 * 1024,
            max_part_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// How an upload attempt resolved
#[derive(Debug)]
pub enum UploadOutcome {
    /// The API accepted the recording
    Uploaded { receipt: UploadReceipt },

    /// The upload failed and the blob was written to the fallback
    /// directory instead
    SavedLocally { path: PathBuf, error: UploadError },
}

/// Uploads finished recordings, falling back to a local save on failure
pub struct Uploader {
    api: Arc<dyn RecordingsApi>,
    config: UploadConfig,
    fallback_dir: PathBuf,
}

impl Uploader {
    /// Create an uploader writing fallback saves into `fallback_dir`
    pub fn new(api: Arc<dyn RecordingsApi>, fallback_dir: PathBuf) -> Self {
        Self {
            api,
            config: UploadConfig::default(),
            fallback_dir,
        }
    }

    /// Override the default tuning (tests, future settings surface)
    pub fn with_config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    /// Upload a recording. Any failure falls back to a local save
    /// exactly once; the error that caused it is carried in the outcome.
    /// Only a failed fallback write itself is returned as `Err`.
    pub async fn upload(&self, blob: &RecordedBlob) -> Result<UploadOutcome, UploadError> {
        match self.try_upload(blob).await {
            Ok(receipt) => {
                tracing::info!("Recording uploaded: {}", blob.filename);
                Ok(UploadOutcome::Uploaded { receipt })
            }
            Err(error) => {
                tracing::error!("Upload failed: {}. Falling back to local save.", error);
                let path = self.save_locally(blob)?;
                Ok(UploadOutcome::SavedLocally { path, error })
            }
        }
    }

    async fn try_upload(&self, blob: &RecordedBlob) -> Result<UploadReceipt, UploadError> {
        let size = blob.data.len() as u64;

        if size < self.config.small_file_cutoff {
            tracing::info!("Using single-call upload for {} ({} bytes)", blob.filename, size);
            return self
                .api
                .upload_small(&blob.filename, &blob.content_type, blob.data.clone())
                .await;
        }

        tracing::info!("Using multipart upload for {} ({} bytes)", blob.filename, size);
        match self.upload_multipart(blob).await {
            Ok(receipt) => Ok(receipt),
            Err(error) if size < self.config.single_call_fallback_cutoff => {
                // Files just over the cutoff are still worth one
                // single-call attempt before giving up
                tracing::warn!(
                    "Multipart upload failed ({}), trying single-call upload",
                    error
                );
                self.api
                    .upload_small(&blob.filename, &blob.content_type, blob.data.clone())
                    .await
            }
            Err(error) => Err(error),
        }
    }

    async fn upload_multipart(&self, blob: &RecordedBlob) -> Result<UploadReceipt, UploadError> {
        let size = blob.data.len() as u64;

        let upload_id = self
            .api
            .start_multipart(&blob.filename, size, &blob.content_type)
            .await?;

        let urls = self
            .api
            .presigned_urls(&blob.filename, &upload_id, size)
            .await?;
        if urls.is_empty() {
            return Err(UploadError::NoPresignedUrls);
        }

        let chunk_size = split_chunk_size(blob.data.len(), urls.len());

        let mut parts = Vec::with_capacity(urls.len());
        for (index, (url, chunk)) in urls.iter().zip(blob.data.chunks(chunk_size)).enumerate() {
            let part_number = index as u32 + 1;

            tracing::info!("Uploading part {}/{}", part_number, urls.len());
            let etag = self
                .upload_part_with_retry(url, chunk.to_vec(), &blob.content_type, part_number)
                .await?;

            parts.push(CompletedPart { etag, part_number });
        }

        self.api
            .complete_multipart(&blob.filename, &upload_id, order_parts(parts))
            .await
    }

    async fn upload_part_with_retry(
        &self,
        url: &str,
        chunk: Vec<u8>,
        content_type: &str,
        part_number: u32,
    ) -> Result<String, UploadError> {
        let max_attempts = self.config.max_part_attempts;

        for attempt in 1..=max_attempts {
            match self
                .api
                .upload_part(url, chunk.clone(), content_type, part_number)
                .await
            {
                Ok(etag) => return Ok(etag),
                Err(error) => {
                    tracing::warn!(
                        "Part {} failed (attempt {}/{}): {}",
                        part_number,
                        attempt,
                        max_attempts,
                        error
                    );

                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_base_delay * 2u32.pow(attempt))
                            .await;
                    }
                }
            }
        }

        Err(UploadError::PartFailed {
            part_number,
            attempts: max_attempts,
        })
    }

    /// Write the blob into the fallback directory
    fn save_locally(&self, blob: &RecordedBlob) -> Result<PathBuf, UploadError> {
        std::fs::create_dir_all(&self.fallback_dir)?;

        let path = self.fallback_dir.join(&blob.filename);
        std::fs::write(&path, &blob.data)?;

        tracing::info!("Recording saved locally: {:?}", path);
        Ok(path)
    }
}

/// Chunk size that spreads `total` bytes evenly across `parts` chunks
pub fn split_chunk_size(total: usize, parts: usize) -> usize {
    total.div_ceil(parts.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::tempdir;

    fn make_blob(size: usize) -> RecordedBlob {
        RecordedBlob {
            filename: "recording-1700000000000.webm".to_string(),
            path: PathBuf::from("/tmp/recording-1700000000000.webm"),
            data: vec![7u8; size],
            content_type: "video/webm".to_string(),
            duration_ms: 1000.0,
        }
    }

    fn test_config() -> UploadConfig {
        UploadConfig {
            small_file_cutoff: 100,
            single_call_fallback_cutoff: 200,
            max_part_attempts: 3,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[derive(Default)]
    struct MockApi {
        small_calls: AtomicU32,
        part_calls: AtomicU32,
        completed: Mutex<Option<Vec<CompletedPart>>>,
        fail_small: bool,
        fail_parts: bool,
        url_count: usize,
    }

    #[async_trait]
    impl RecordingsApi for MockApi {
        async fn upload_small(
            &self,
            _filename: &str,
            _content_type: &str,
            _data: Vec<u8>,
        ) -> Result<UploadReceipt, UploadError> {
            self.small_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_small {
                Err(UploadError::ServerError {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(serde_json::json!({"ok": true}))
            }
        }

        async fn start_multipart(
            &self,
            _filename: &str,
            _file_size: u64,
            _content_type: &str,
        ) -> Result<String, UploadError> {
            Ok("upload-1".to_string())
        }

        async fn presigned_urls(
            &self,
            _filename: &str,
            _upload_id: &str,
            _file_size: u64,
        ) -> Result<Vec<String>, UploadError> {
            Ok((0..self.url_count)
                .map(|i| format!("https://storage.example/part-{i}"))
                .collect())
        }

        async fn upload_part(
            &self,
            _presigned_url: &str,
            _data: Vec<u8>,
            _content_type: &str,
            part_number: u32,
        ) -> Result<String, UploadError> {
            self.part_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_parts {
                Err(UploadError::ServerError {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(format!("etag-{part_number}"))
            }
        }

        async fn complete_multipart(
            &self,
            _filename: &str,
            _upload_id: &str,
            parts: Vec<CompletedPart>,
        ) -> Result<UploadReceipt, UploadError> {
            *self.completed.lock() = Some(parts);
            Ok(serde_json::json!({"ok": true}))
        }
    }

    #[test]
    fn test_split_chunk_size_rounds_up() {
        assert_eq!(split_chunk_size(10, 3), 4);
        assert_eq!(split_chunk_size(9, 3), 3);
        assert_eq!(split_chunk_size(1, 5), 1);
        assert_eq!(split_chunk_size(0, 0), 1);
    }

    #[tokio::test]
    async fn test_small_file_takes_single_call_path() {
        let dir = tempdir().unwrap();
        let api = Arc::new(MockApi {
            url_count: 4,
            ..Default::default()
        });
        let uploader =
            Uploader::new(api.clone(), dir.path().to_path_buf()).with_config(test_config());

        let outcome = uploader.upload(&make_blob(50)).await.unwrap();

        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
        assert_eq!(api.small_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.part_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_large_file_uploads_all_parts_in_order() {
        let dir = tempdir().unwrap();
        let api = Arc::new(MockApi {
            url_count: 4,
            ..Default::default()
        });
        let uploader =
            Uploader::new(api.clone(), dir.path().to_path_buf()).with_config(test_config());

        let outcome = uploader.upload(&make_blob(300)).await.unwrap();

        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
        assert_eq!(api.part_calls.load(Ordering::SeqCst), 4);

        let completed = api.completed.lock().take().unwrap();
        let numbers: Vec<u32> = completed.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_part_retries_are_bounded() {
        let dir = tempdir().unwrap();
        let api = Arc::new(MockApi {
            url_count: 4,
            fail_parts: true,
            fail_small: true,
            ..Default::default()
        });
        let uploader =
            Uploader::new(api.clone(), dir.path().to_path_buf()).with_config(test_config());

        let outcome = uploader.upload(&make_blob(300)).await.unwrap();

        // The first part exhausts its 3 attempts, then the upload aborts
        assert_eq!(api.part_calls.load(Ordering::SeqCst), 3);
        assert!(matches!(outcome, UploadOutcome::SavedLocally { .. }));
    }

    #[tokio::test]
    async fn test_multipart_failure_retries_single_call_under_cutoff() {
        let dir = tempdir().unwrap();
        let api = Arc::new(MockApi {
            url_count: 2,
            fail_parts: true,
            ..Default::default()
        });
        let uploader =
            Uploader::new(api.clone(), dir.path().to_path_buf()).with_config(test_config());

        // 150 bytes: over the multipart cutoff, under the fallback cutoff
        let outcome = uploader.upload(&make_blob(150)).await.unwrap();

        assert_eq!(api.small_calls.load(Ordering::SeqCst), 1);
        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
    }

    #[tokio::test]
    async fn test_failed_upload_saves_locally_exactly_once() {
        let dir = tempdir().unwrap();
        let api = Arc::new(MockApi {
            url_count: 2,
            fail_parts: true,
            fail_small: true,
            ..Default::default()
        });
        let uploader =
            Uploader::new(api.clone(), dir.path().to_path_buf()).with_config(test_config());

        let blob = make_blob(300);
        let outcome = uploader.upload(&blob).await.unwrap();

        match outcome {
            UploadOutcome::SavedLocally { path, .. } => {
                assert!(path.exists());
                assert_eq!(std::fs::read(&path).unwrap(), blob.data);
            }
            other => panic!("Expected local save, got {:?}", other),
        }

        // Exactly one fallback file was written
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
