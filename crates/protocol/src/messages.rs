use serde::{Deserialize, Serialize};

/// Response envelope used by every ingestion API route.
///
/// Exactly one of `data` and `error` is expected to be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Allocates an upload session for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadRequest {
    pub filename: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// Session allocated by the endpoint. The id scopes every subsequent
/// chunk request of this attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadResponse {
    pub upload_id: String,
}
