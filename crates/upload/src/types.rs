use std::path::{Path, PathBuf};

use fluentra_protocol::{ProgressSnapshot, UploadStatus};

use crate::UploadError;
use crate::chunked::ChunkPlan;

/// A candidate audio file for upload.
///
/// Immutable for the duration of one attempt; the source file must not
/// change while the upload is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Display name sent to the endpoint.
    pub name: String,
    /// Total size in bytes.
    pub size_bytes: u64,
    /// MIME type, e.g. `audio/wav`.
    pub mime_type: String,
    /// Source file on disk.
    pub path: PathBuf,
}

impl UploadTarget {
    /// Builds a target from a file on disk, inferring the MIME type from
    /// the extension.
    ///
    /// Fails with [`UploadError::UnsupportedType`] when the extension maps
    /// to no known audio type. Size limits are checked later, in
    /// validation.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let mime = crate::validation::mime_type_for_extension(path).ok_or_else(|| {
            UploadError::UnsupportedType {
                mime_type: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            }
        })?;
        Self::with_mime_type(path, mime)
    }

    /// Builds a target with an explicit MIME type, bypassing extension
    /// inference.
    pub fn with_mime_type(path: &Path, mime_type: &str) -> Result<Self, UploadError> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_string();
        Ok(Self {
            name,
            size_bytes: meta.len(),
            mime_type: mime_type.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// One contiguous byte range of the source file, transmitted as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the chunk sequence.
    pub index: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
    /// SHA-256 hex checksum of `data`.
    pub checksum: String,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Session id under which the recording was ingested.
    pub upload_id: String,
}

/// Event emitted by the sequencer during an upload attempt.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// One chunk acknowledged. Emitted exactly once per chunk, in chunk
    /// order.
    Progress(ProgressSnapshot),
    /// Every chunk acknowledged.
    Completed { upload_id: String },
    /// The attempt ended before the last chunk.
    Failed { error: String },
}

/// State of one upload attempt.
///
/// Owned exclusively by the sequencer — one writer, no locks — and
/// discarded when the attempt ends.
#[derive(Debug)]
pub struct UploadSession {
    id: String,
    total_bytes: u64,
    chunk_size_bytes: u64,
    total_chunks: u32,
    next_chunk_index: u32,
    status: UploadStatus,
}

impl UploadSession {
    /// Creates a session in `preparing`, immediately before the first
    /// network call.
    pub fn new(total_bytes: u64, chunk_size_bytes: u64) -> Self {
        let plan = ChunkPlan::new(total_bytes, chunk_size_bytes);
        Self {
            id: String::new(),
            total_bytes,
            chunk_size_bytes: plan.chunk_size_bytes(),
            total_chunks: plan.total_chunks(),
            next_chunk_index: 0,
            status: UploadStatus::Preparing,
        }
    }

    /// Adopts the endpoint-issued session id.
    pub fn begin(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Marks the session `uploading`; called when chunk 0 is sent.
    pub fn start(&mut self) {
        self.status = UploadStatus::Uploading;
    }

    /// Records one acknowledged chunk: advances the counter and flips to
    /// `complete` after the last one.
    pub fn record_chunk(&mut self) {
        self.next_chunk_index = (self.next_chunk_index + 1).min(self.total_chunks);
        if self.next_chunk_index == self.total_chunks {
            self.status = UploadStatus::Complete;
        }
    }

    /// Marks the session failed.
    pub fn fail(&mut self) {
        self.status = UploadStatus::Error;
    }

    /// Returns the current progress as a snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        if self.next_chunk_index == 0 {
            return ProgressSnapshot {
                bytes_uploaded: 0,
                total_bytes: self.total_bytes,
                percentage: 0.0,
                current_chunk: 0,
                total_chunks: self.total_chunks,
                status: self.status,
            };
        }
        let mut snap = crate::progress::snapshot(
            self.next_chunk_index - 1,
            self.total_chunks,
            self.chunk_size_bytes,
            self.total_bytes,
        );
        // A failed session reports `error` even for fully counted chunks.
        snap.status = self.status;
        snap
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn next_chunk_index(&self) -> u32 {
        self.next_chunk_index
    }

    /// Returns `true` while the attempt can still make progress.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_from_path_infers_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.wav");
        std::fs::write(&path, b"RIFFdata").unwrap();

        let target = UploadTarget::from_path(&path).unwrap();
        assert_eq!(target.name, "session.wav");
        assert_eq!(target.size_bytes, 8);
        assert_eq!(target.mime_type, "audio/wav");
    }

    #[test]
    fn target_from_path_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = UploadTarget::from_path(&path).unwrap_err();
        assert!(matches!(
            err,
            UploadError::UnsupportedType { ref mime_type } if mime_type == "txt"
        ));
    }

    #[test]
    fn target_explicit_mime_overrides_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.bin");
        std::fs::write(&path, b"\0\0\0\0").unwrap();

        let target = UploadTarget::with_mime_type(&path, "audio/wav").unwrap();
        assert_eq!(target.mime_type, "audio/wav");
        assert_eq!(target.size_bytes, 4);
    }

    #[test]
    fn target_missing_file_is_io_error() {
        let err = UploadTarget::from_path(Path::new("/nonexistent/take.mp3")).unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }

    #[test]
    fn new_session_is_preparing() {
        let session = UploadSession::new(2_500_000, 1_000_000);
        assert_eq!(session.status(), UploadStatus::Preparing);
        assert_eq!(session.total_chunks(), 3);
        assert_eq!(session.next_chunk_index(), 0);
        assert!(session.is_active());
    }

    #[test]
    fn session_lifecycle_to_complete() {
        let mut session = UploadSession::new(2_500_000, 1_000_000);
        session.begin("u-1");
        session.start();
        assert_eq!(session.status(), UploadStatus::Uploading);

        session.record_chunk();
        session.record_chunk();
        assert_eq!(session.status(), UploadStatus::Uploading);
        assert_eq!(session.next_chunk_index(), 2);

        session.record_chunk();
        assert_eq!(session.status(), UploadStatus::Complete);
        assert_eq!(session.next_chunk_index(), 3);
        assert!(!session.is_active());
        assert_eq!(session.id(), "u-1");
    }

    #[test]
    fn session_counter_is_monotonic_and_capped() {
        let mut session = UploadSession::new(100, 100);
        session.start();
        session.record_chunk();
        session.record_chunk(); // past the end; must not overflow the counter
        assert_eq!(session.next_chunk_index(), 1);
        assert_eq!(session.status(), UploadStatus::Complete);
    }

    #[test]
    fn session_fail_reports_error_status() {
        let mut session = UploadSession::new(300, 100);
        session.start();
        session.record_chunk();
        session.fail();
        assert_eq!(session.status(), UploadStatus::Error);
        assert!(!session.is_active());

        let snap = session.snapshot();
        assert_eq!(snap.status, UploadStatus::Error);
        assert_eq!(snap.current_chunk, 1);
    }

    #[test]
    fn session_snapshot_before_first_chunk() {
        let session = UploadSession::new(300, 100);
        let snap = session.snapshot();
        assert_eq!(snap.bytes_uploaded, 0);
        assert_eq!(snap.current_chunk, 0);
        assert_eq!(snap.total_chunks, 3);
        assert_eq!(snap.status, UploadStatus::Preparing);
    }

    #[test]
    fn session_snapshot_tracks_bytes() {
        let mut session = UploadSession::new(250, 100);
        session.start();
        session.record_chunk();
        let snap = session.snapshot();
        assert_eq!(snap.bytes_uploaded, 100);

        session.record_chunk();
        session.record_chunk();
        let snap = session.snapshot();
        assert_eq!(snap.bytes_uploaded, 250);
        assert!((snap.percentage - 100.0).abs() < f64::EPSILON);
    }
}
