//! Wire types for the Fluentra audio ingestion API.
//!
//! Shared by the upload engine and the HTTP client so both sides agree
//! on payload shapes and on the reference transfer limits.

pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use messages::{ApiEnvelope, InitiateUploadRequest, InitiateUploadResponse};
pub use types::{ProgressSnapshot, UploadStatus};
