//! Recording upload
//!
//! Typed client for the recordings API plus the orchestration that
//! decides between the single-call and multipart paths, retries parts,
//! and falls back to a local save.

pub mod client;
pub mod error;
pub mod types;
pub mod uploader;

pub use client::{RecordingsApi, RecordingsApiClient};
pub use error::UploadError;
pub use types::{order_parts, CompletedPart, UploadReceipt};
pub use uploader::{UploadConfig, UploadOutcome, Uploader};
