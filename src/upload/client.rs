//! Typed REST client for the recordings API.
//!
//! Control-plane calls carry the bearer token from local storage; the
//! per-part PUTs go straight to the presigned storage URLs without it.

use super::error::UploadError;
use super::types::{
    order_parts, CompleteMultipartRequest, CompletedPart, PresignedUrlsRequest,
    PresignedUrlsResponse, StartMultipartRequest, StartMultipartResponse, UploadReceipt,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Timeout for control-plane calls (start/presign/complete)
const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the single-call upload path
const SMALL_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for one part PUT
const PART_TIMEOUT: Duration = Duration::from_secs(300);

/// Operations the uploader needs from the recordings API.
///
/// A trait seam so the upload orchestration can be exercised without a
/// network.
#[async_trait]
pub trait RecordingsApi: Send + Sync {
    /// Single-call upload for small payloads
    async fn upload_small(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadReceipt, UploadError>;

    /// Initiate a multipart upload, returning the upload identifier
    async fn start_multipart(
        &self,
        filename: &str,
        file_size: u64,
        content_type: &str,
    ) -> Result<String, UploadError>;

    /// Request the set of presigned per-part upload URLs
    async fn presigned_urls(
        &self,
        filename: &str,
        upload_id: &str,
        file_size: u64,
    ) -> Result<Vec<String>, UploadError>;

    /// PUT one part to its presigned URL, returning the ETag
    async fn upload_part(
        &self,
        presigned_url: &str,
        data: Vec<u8>,
        content_type: &str,
        part_number: u32,
    ) -> Result<String, UploadError>;

    /// Complete the multipart upload with the ordered (ETag, part) pairs
    async fn complete_multipart(
        &self,
        filename: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<UploadReceipt, UploadError>;
}

/// reqwest-backed client for the recordings API
#[derive(Debug, Clone)]
pub struct RecordingsApiClient {
    base_url: String,
    auth_token: String,
    http: Client,
}

impl RecordingsApiClient {
    /// Create a new client pointing at the given API base URL
    pub fn new(base_url: &str, auth_token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .bearer_auth(&self.auth_token)
            .timeout(CONTROL_TIMEOUT)
    }
}

/// Parse a JSON response body, mapping HTTP errors to [`UploadError`]
async fn parse_api_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UploadError> {
    let status = response.status().as_u16();
    match status {
        200..=299 => response
            .json()
            .await
            .map_err(|e| UploadError::InvalidResponse(e.to_string())),
        401 => Err(UploadError::NotAuthenticated),
        413 => Err(UploadError::PayloadTooLarge),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(UploadError::ServerError { status, body })
        }
    }
}

#[async_trait]
impl RecordingsApi for RecordingsApiClient {
    async fn upload_small(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<UploadReceipt, UploadError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(self.url("/recordings/upload"))
            .bearer_auth(&self.auth_token)
            .timeout(SMALL_UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        parse_api_response(response).await
    }

    async fn start_multipart(
        &self,
        filename: &str,
        file_size: u64,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let request = StartMultipartRequest {
            file_name: filename.to_string(),
            file_size,
            content_type: content_type.to_string(),
        };

        let response = self
            .post("/recordings/start-multipart-upload")
            .json(&request)
            .send()
            .await?;

        let body: StartMultipartResponse = parse_api_response(response).await?;

        tracing::info!("Multipart upload started: {}", body.upload_id);
        Ok(body.upload_id)
    }

    async fn presigned_urls(
        &self,
        filename: &str,
        upload_id: &str,
        file_size: u64,
    ) -> Result<Vec<String>, UploadError> {
        let request = PresignedUrlsRequest {
            file_name: filename.to_string(),
            upload_id: upload_id.to_string(),
            file_size,
        };

        let response = self
            .post("/recordings/generate-presigned-url")
            .json(&request)
            .send()
            .await?;

        let body: PresignedUrlsResponse = parse_api_response(response).await?;

        tracing::info!("Presigned URLs generated: {}", body.presigned_urls.len());
        Ok(body.presigned_urls)
    }

    async fn upload_part(
        &self,
        presigned_url: &str,
        data: Vec<u8>,
        content_type: &str,
        part_number: u32,
    ) -> Result<String, UploadError> {
        let response = self
            .http
            .put(presigned_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .timeout(PART_TIMEOUT)
            .body(data)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..=299).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::ServerError { status, body });
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.replace('"', ""))
            .ok_or(UploadError::MissingEtag(part_number))?;

        tracing::debug!("Part {} uploaded (etag {})", part_number, etag);
        Ok(etag)
    }

    async fn complete_multipart(
        &self,
        filename: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<UploadReceipt, UploadError> {
        let request = CompleteMultipartRequest {
            file_name: filename.to_string(),
            upload_id: upload_id.to_string(),
            parts: order_parts(parts),
        };

        let response = self
            .post("/recordings/complete-multipart-upload")
            .json(&request)
            .send()
            .await?;

        let receipt = parse_api_response(response).await?;

        tracing::info!("Multipart upload completed: {}", upload_id);
        Ok(receipt)
    }
}
