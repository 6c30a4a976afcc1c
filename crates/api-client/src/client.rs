//! Ingestion API client.
//!
//! Async HTTP client using `reqwest`, with optional Bearer token
//! authentication.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use fluentra_protocol::{
    ApiEnvelope, InitiateUploadRequest, InitiateUploadResponse, ProgressSnapshot,
};
use fluentra_upload::{Chunk, EndpointError, UploadEndpoint};

/// Errors from the ingestion API client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API rejected request: {0}")]
    Rejected(String),

    #[error("invalid bearer token")]
    InvalidToken,

    #[error("response envelope carried no data")]
    MissingData,
}

impl Error {
    /// Maps a client error onto the engine's endpoint error.
    fn into_endpoint(self) -> EndpointError {
        match self {
            Error::Http(e) => EndpointError::Transport(e.to_string()),
            Error::Api { status, body } => EndpointError::Api { status, body },
            Error::Json(e) => EndpointError::Json(e),
            // Application-level rejection under an HTTP 200.
            Error::Rejected(msg) => EndpointError::Api {
                status: 200,
                body: msg,
            },
            Error::InvalidToken => EndpointError::Transport("invalid bearer token".into()),
            Error::MissingData => EndpointError::MissingData,
        }
    }
}

/// Ingestion API client.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the given API base URL, optionally attaching
    /// a bearer token to every request.
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| Error::InvalidToken)?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Allocates an upload session.
    pub async fn initiate_upload(
        &self,
        req: &InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, Error> {
        debug!(filename = %req.filename, size = req.file_size, "initiating upload");
        self.post_json("/upload/initiate", req).await
    }

    /// Transmits one chunk as a multipart form and returns the server's
    /// progress snapshot.
    pub async fn send_chunk(
        &self,
        upload_id: &str,
        chunk: &Chunk,
    ) -> Result<ProgressSnapshot, Error> {
        debug!(
            upload_id,
            chunk = chunk.index,
            len = chunk.data.len(),
            "posting chunk"
        );

        let url = format!("{}/upload/{upload_id}/chunk", self.base_url);
        let part = reqwest::multipart::Part::bytes(chunk.data.clone())
            .file_name("chunk")
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new()
            .part("chunk", part)
            .text("chunkIndex", chunk.index.to_string())
            .text("checksum", chunk.checksum.clone());

        let resp = self.http.post(&url).multipart(form).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        unwrap_envelope(&bytes)
    }

    /// Performs a JSON POST and unwraps the response envelope.
    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.http.post(&url).json(body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        unwrap_envelope(&bytes)
    }
}

/// Parses an envelope body, surfacing application-level errors.
fn unwrap_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    let env: ApiEnvelope<T> = serde_json::from_slice(body)?;
    if let Some(msg) = env.error {
        return Err(Error::Rejected(msg));
    }
    env.data.ok_or(Error::MissingData)
}

impl UploadEndpoint for ApiClient {
    fn initiate<'a>(
        &'a self,
        req: &'a InitiateUploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InitiateUploadResponse, EndpointError>> + Send + 'a>>
    {
        Box::pin(async move { self.initiate_upload(req).await.map_err(Error::into_endpoint) })
    }

    fn upload_chunk<'a>(
        &'a self,
        upload_id: &'a str,
        chunk: &'a Chunk,
    ) -> Pin<Box<dyn Future<Output = Result<ProgressSnapshot, EndpointError>> + Send + 'a>> {
        Box::pin(async move {
            self.send_chunk(upload_id, chunk)
                .await
                .map_err(Error::into_endpoint)
        })
    }
}
