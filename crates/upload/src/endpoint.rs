use std::future::Future;
use std::pin::Pin;

use fluentra_protocol::{InitiateUploadRequest, InitiateUploadResponse, ProgressSnapshot};

use crate::types::Chunk;

/// Errors crossing the endpoint boundary.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    TimedOut,

    #[error("empty response body")]
    MissingData,
}

/// Abstract ingestion endpoint.
///
/// The HTTP client implements this on top of its transport; tests inject
/// deterministic fakes. Keeping the seam here means the sequencer is
/// constructed with an explicit endpoint instead of reaching for a
/// module-level client.
pub trait UploadEndpoint: Send + Sync {
    /// Allocates an upload session for the described file.
    fn initiate<'a>(
        &'a self,
        req: &'a InitiateUploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InitiateUploadResponse, EndpointError>> + Send + 'a>>;

    /// Transmits one chunk and returns the endpoint's progress echo.
    ///
    /// A chunk is fully identified by `(upload_id, chunk.index)`, which
    /// makes re-sends after a network blip idempotent server-side.
    fn upload_chunk<'a>(
        &'a self,
        upload_id: &'a str,
        chunk: &'a Chunk,
    ) -> Pin<Box<dyn Future<Output = Result<ProgressSnapshot, EndpointError>> + Send + 'a>>;
}
