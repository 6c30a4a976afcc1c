use serde::{Deserialize, Serialize};

/// Lifecycle state of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    /// Session created, no chunk sent yet.
    #[serde(rename = "preparing")]
    Preparing,
    #[serde(rename = "uploading")]
    Uploading,
    /// Server-side analysis after the last chunk. Reported by the
    /// endpoint only; the engine never enters this state itself.
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "error")]
    Error,
}

impl UploadStatus {
    /// Returns `true` while the attempt can still make progress.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Preparing | Self::Uploading)
    }
}

/// Progress after a completed chunk.
///
/// Immutable value; a fresh snapshot is produced for every acknowledged
/// chunk and handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    /// 0–100, `100 * bytes_uploaded / total_bytes`.
    pub percentage: f64,
    /// Number of chunks acknowledged so far (1-based after the first).
    pub current_chunk: u32,
    pub total_chunks: u32,
    pub status: UploadStatus,
}

impl ProgressSnapshot {
    /// Returns `true` once every chunk has been acknowledged.
    pub fn is_final(&self) -> bool {
        self.current_chunk == self.total_chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Preparing).unwrap(),
            "\"preparing\""
        );
        assert_eq!(
            serde_json::to_string(&UploadStatus::Complete).unwrap(),
            "\"complete\""
        );
    }

    #[test]
    fn status_active_states() {
        assert!(UploadStatus::Preparing.is_active());
        assert!(UploadStatus::Uploading.is_active());
        assert!(!UploadStatus::Processing.is_active());
        assert!(!UploadStatus::Complete.is_active());
        assert!(!UploadStatus::Error.is_active());
    }

    #[test]
    fn snapshot_field_names() {
        let snap = ProgressSnapshot {
            bytes_uploaded: 512,
            total_bytes: 1024,
            percentage: 50.0,
            current_chunk: 1,
            total_chunks: 2,
            status: UploadStatus::Uploading,
        };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"bytesUploaded\":512"));
        assert!(json.contains("\"totalBytes\":1024"));
        assert!(json.contains("\"currentChunk\":1"));
        assert!(json.contains("\"totalChunks\":2"));
        assert!(json.contains("\"status\":\"uploading\""));
    }

    #[test]
    fn snapshot_json_roundtrip() {
        let snap = ProgressSnapshot {
            bytes_uploaded: 2_621_440,
            total_bytes: 2_621_440,
            percentage: 100.0,
            current_chunk: 3,
            total_chunks: 3,
            status: UploadStatus::Complete,
        };
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: ProgressSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, parsed);
        assert!(parsed.is_final());
    }

    #[test]
    fn snapshot_not_final_midway() {
        let snap = ProgressSnapshot {
            bytes_uploaded: 100,
            total_bytes: 300,
            percentage: 33.3,
            current_chunk: 1,
            total_chunks: 3,
            status: UploadStatus::Uploading,
        };
        assert!(!snap.is_final());
    }
}
