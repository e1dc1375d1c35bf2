//! Request/response types for the recordings API.
//!
//! Field names mirror the wire format of the API (camelCase, except the
//! `PartNumber` casing the completion endpoint expects).

use serde::{Deserialize, Serialize};

/// `POST /recordings/start-multipart-upload` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartRequest {
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
}

/// `POST /recordings/start-multipart-upload` response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartResponse {
    pub upload_id: String,
}

/// `POST /recordings/generate-presigned-url` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlsRequest {
    pub file_name: String,
    pub upload_id: String,
    pub file_size: u64,
}

/// `POST /recordings/generate-presigned-url` response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlsResponse {
    pub presigned_urls: Vec<String>,
}

/// One uploaded part: the ETag the storage service returned and its
/// 1-based part number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

/// `POST /recordings/complete-multipart-upload` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartRequest {
    pub file_name: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPart>,
}

/// Whatever the API returns on a successful upload
pub type UploadReceipt = serde_json::Value;

/// Order parts by part number, as the completion endpoint requires
pub fn order_parts(mut parts: Vec<CompletedPart>) -> Vec<CompletedPart> {
    parts.sort_by_key(|p| p.part_number);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_parts_sorts_by_part_number() {
        let parts = vec![
            CompletedPart {
                etag: "c".to_string(),
                part_number: 3,
            },
            CompletedPart {
                etag: "a".to_string(),
                part_number: 1,
            },
            CompletedPart {
                etag: "b".to_string(),
                part_number: 2,
            },
        ];

        let ordered = order_parts(parts);

        let numbers: Vec<u32> = ordered.iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(ordered[0].etag, "a");
    }

    #[test]
    fn test_completed_part_wire_format() {
        let part = CompletedPart {
            etag: "abc123".to_string(),
            part_number: 2,
        };

        let json = serde_json::to_value(&part).unwrap();

        // The completion endpoint expects this exact casing
        assert_eq!(json["etag"], "abc123");
        assert_eq!(json["PartNumber"], 2);
    }

    #[test]
    fn test_start_request_wire_format() {
        let request = StartMultipartRequest {
            file_name: "recording-123.webm".to_string(),
            file_size: 1024,
            content_type: "video/webm".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["fileName"], "recording-123.webm");
        assert_eq!(json["fileSize"], 1024);
        assert_eq!(json["contentType"], "video/webm");
    }
}
