//! HTTP client for the Fluentra audio ingestion API.
//!
//! Speaks the REST contract of the ingestion service: JSON for session
//! initiation, multipart forms for chunk posts, every response wrapped in
//! an [`fluentra_protocol::ApiEnvelope`]. Implements
//! [`fluentra_upload::UploadEndpoint`] so the engine can drive it
//! directly.

mod client;

pub use client::{ApiClient, Error};
