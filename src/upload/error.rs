//! Error types for the recordings API client and uploader.

use thiserror::Error;

/// Errors returned by upload operations
#[derive(Debug, Error)]
pub enum UploadError {
    /// The stored token is missing, expired, or invalid (HTTP 401).
    #[error("Authentication failed: invalid or expired token. Please login again.")]
    NotAuthenticated,

    /// The payload exceeded the single-call limit (HTTP 413).
    #[error("File too large for single upload")]
    PayloadTooLarge,

    /// A server error with status code and body.
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// The storage service did not return an ETag for an uploaded part.
    #[error("Missing ETag for part {0}")]
    MissingEtag(u32),

    /// The server returned a body that could not be parsed.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// A part kept failing after the bounded retries.
    #[error("Failed to upload part {part_number} after {attempts} attempts")]
    PartFailed { part_number: u32, attempts: u32 },

    /// The server returned no presigned URLs to upload to.
    #[error("No presigned URLs returned for multipart upload")]
    NoPresignedUrls,

    /// A network or transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local filesystem error (fallback save).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
