//! Chunked audio upload engine.
//!
//! This crate implements the transfer logic for sending a speech
//! recording to the ingestion API. It is a library crate with no UI or
//! HTTP dependencies — the transport is injected through the
//! [`UploadEndpoint`] trait.
//!
//! # Pipeline
//!
//! 1. **Validate** — type/size checks before any network call
//! 2. **Initiate** — allocate an upload session on the endpoint
//! 3. **Upload** — send chunks strictly in order, with bounded retry
//! 4. **Progress** — one snapshot per acknowledged chunk
//! 5. **Complete** — terminal event plus the session id

mod chunked;
mod endpoint;
mod progress;
mod types;
mod uploader;
mod validation;

pub use chunked::{ChunkPlan, ChunkReader, checksum_bytes};
pub use endpoint::{EndpointError, UploadEndpoint};
pub use progress::{RateWindow, snapshot};
pub use types::{Chunk, UploadEvent, UploadResult, UploadSession, UploadTarget};
pub use uploader::{RetryPolicy, Uploader};
pub use validation::{UploadLimits, mime_type_for_extension, validate_target};

/// Errors produced by the upload engine.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported audio type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("file too large: {size_bytes} bytes (limit {max_bytes})")]
    TooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("empty file")]
    EmptyFile,

    #[error("upload initiation failed: {0}")]
    InitiationFailed(#[source] EndpointError),

    #[error("chunk {chunk_index} failed: {source}")]
    ChunkUploadFailed {
        chunk_index: u32,
        #[source]
        source: EndpointError,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
