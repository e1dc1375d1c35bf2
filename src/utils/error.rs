//! Error types and handling
//!
//! Common error types used across the application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Recording(_) => "RECORDING_ERROR",
            AppError::Upload(_) => "UPLOAD_ERROR",
            AppError::DeviceNotFound(_) => "DEVICE_NOT_FOUND",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<crate::recorder::RecordingError> for AppError {
    fn from(error: crate::recorder::RecordingError) -> Self {
        use crate::recorder::RecordingError;
        match error {
            RecordingError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            RecordingError::DeviceNotFound(msg) => AppError::DeviceNotFound(msg),
            RecordingError::Io(e) => AppError::Io(e),
            other => AppError::Recording(other.to_string()),
        }
    }
}

impl From<crate::upload::UploadError> for AppError {
    fn from(error: crate::upload::UploadError) -> Self {
        use crate::upload::UploadError;
        match error {
            UploadError::Io(e) => AppError::Io(e),
            other => AppError::Upload(other.to_string()),
        }
    }
}
