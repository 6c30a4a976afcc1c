//! The chunk sequencer: drives one upload attempt from validation to
//! completion.
//!
//! Chunks are transmitted strictly in order, one request in flight at a
//! time. Each chunk gets a bounded number of attempts with jittered
//! exponential backoff between them; cancellation is checked between
//! chunks and raced against in-flight requests and backoff sleeps.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fluentra_protocol::constants::{
    CHUNK_REQUEST_TIMEOUT, DEFAULT_CHUNK_SIZE, INITIATE_REQUEST_TIMEOUT, MAX_CHUNK_ATTEMPTS,
};
use fluentra_protocol::{InitiateUploadRequest, ProgressSnapshot};

use crate::UploadError;
use crate::chunked::ChunkReader;
use crate::endpoint::{EndpointError, UploadEndpoint};
use crate::types::{Chunk, UploadEvent, UploadResult, UploadSession, UploadTarget};
use crate::validation::{UploadLimits, validate_target};

/// Per-chunk retry schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Transmission attempts per chunk (first try plus retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Backoff cap.
    pub max_delay: Duration,
    /// Multiplier per subsequent retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_CHUNK_ATTEMPTS,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-based), exponential with ±25%
    /// jitter to avoid synchronized retries.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        let jitter = capped * 0.25;
        let offset = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64
            / f64::from(u32::MAX))
            * 2.0
            - 1.0; // [-1.0, 1.0)
        Duration::from_secs_f64((capped + jitter * offset).max(0.001))
    }
}

/// Sequences one upload attempt against an [`UploadEndpoint`].
pub struct Uploader<'a> {
    endpoint: &'a dyn UploadEndpoint,
    limits: UploadLimits,
    chunk_size_bytes: u64,
    retry: RetryPolicy,
    initiate_timeout: Duration,
    chunk_timeout: Duration,
    cancel: CancellationToken,
}

impl<'a> Uploader<'a> {
    /// Creates an uploader with the reference limits, chunk size, retry
    /// schedule, and timeouts.
    pub fn new(endpoint: &'a dyn UploadEndpoint) -> Self {
        Self {
            endpoint,
            limits: UploadLimits::default(),
            chunk_size_bytes: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            initiate_timeout: INITIATE_REQUEST_TIMEOUT,
            chunk_timeout: CHUNK_REQUEST_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size_bytes: u64) -> Self {
        self.chunk_size_bytes = chunk_size_bytes;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    /// Returns a token that cancels this upload. Cancellation takes
    /// effect between chunks and interrupts in-flight requests and
    /// backoff sleeps.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the full upload attempt.
    ///
    /// Emits one [`UploadEvent::Progress`] per acknowledged chunk, in
    /// chunk order, then a terminal [`UploadEvent::Completed`] or
    /// [`UploadEvent::Failed`].
    pub async fn upload(
        &self,
        target: &UploadTarget,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<UploadResult, UploadError> {
        match self.run(target, events_tx).await {
            Ok(result) => {
                info!(
                    upload_id = %result.upload_id,
                    bytes = target.size_bytes,
                    "upload complete"
                );
                let _ = events_tx
                    .send(UploadEvent::Completed {
                        upload_id: result.upload_id.clone(),
                    })
                    .await;
                Ok(result)
            }
            Err(e) => {
                warn!(file = %target.name, error = %e, "upload failed");
                let _ = events_tx
                    .send(UploadEvent::Failed {
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        target: &UploadTarget,
        events_tx: &mpsc::Sender<UploadEvent>,
    ) -> Result<UploadResult, UploadError> {
        // Pre-flight checks; a rejected file never reaches the endpoint.
        validate_target(target, &self.limits)?;

        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let mut session = UploadSession::new(target.size_bytes, self.chunk_size_bytes);

        // Allocate the session on the endpoint.
        let req = InitiateUploadRequest {
            filename: target.name.clone(),
            file_size: target.size_bytes,
            mime_type: target.mime_type.clone(),
        };
        let initiate = tokio::time::timeout(self.initiate_timeout, self.endpoint.initiate(&req));
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => {
                session.fail();
                return Err(UploadError::Cancelled);
            }
            res = initiate => res,
        };
        let resp = match outcome {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                session.fail();
                return Err(UploadError::InitiationFailed(e));
            }
            Err(_) => {
                session.fail();
                return Err(UploadError::InitiationFailed(EndpointError::TimedOut));
            }
        };
        session.begin(&resp.upload_id);

        debug!(
            upload_id = %resp.upload_id,
            total_chunks = session.total_chunks(),
            chunk_size = self.chunk_size_bytes,
            "upload session initiated"
        );

        // Open the source off the async thread.
        let path = target.path.clone();
        let chunk_size = self.chunk_size_bytes;
        let mut reader =
            tokio::task::spawn_blocking(move || ChunkReader::open(&path, chunk_size))
                .await
                .map_err(|e| UploadError::Io(std::io::Error::other(e)))??;

        session.start();

        loop {
            if self.cancel.is_cancelled() {
                session.fail();
                return Err(UploadError::Cancelled);
            }

            // File reads are blocking; move the reader out and back.
            let (returned, chunk_result) = tokio::task::spawn_blocking(move || {
                let mut reader = reader;
                let chunk = reader.next_chunk();
                (reader, chunk)
            })
            .await
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?;
            reader = returned;

            let Some(chunk) = chunk_result? else {
                break;
            };

            let echo = self
                .send_chunk_with_retry(&resp.upload_id, &chunk, &mut session)
                .await?;

            session.record_chunk();
            let local = session.snapshot();
            if echo.bytes_uploaded != local.bytes_uploaded
                || echo.current_chunk != local.current_chunk
            {
                warn!(
                    chunk = chunk.index,
                    remote_bytes = echo.bytes_uploaded,
                    local_bytes = local.bytes_uploaded,
                    "endpoint progress echo diverges from local accounting"
                );
            }
            let _ = events_tx.send(UploadEvent::Progress(local)).await;
        }

        Ok(UploadResult {
            upload_id: resp.upload_id,
        })
    }

    /// Sends one chunk, retrying per the policy. Timeouts count as
    /// failed attempts; cancellation wins over both.
    async fn send_chunk_with_retry(
        &self,
        upload_id: &str,
        chunk: &Chunk,
        session: &mut UploadSession,
    ) -> Result<ProgressSnapshot, UploadError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let send = tokio::time::timeout(
                self.chunk_timeout,
                self.endpoint.upload_chunk(upload_id, chunk),
            );
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    session.fail();
                    return Err(UploadError::Cancelled);
                }
                res = send => res,
            };

            let err = match outcome {
                Ok(Ok(snapshot)) => return Ok(snapshot),
                Ok(Err(e)) => e,
                Err(_) => EndpointError::TimedOut,
            };

            if attempt >= self.retry.max_attempts {
                session.fail();
                return Err(UploadError::ChunkUploadFailed {
                    chunk_index: chunk.index,
                    source: err,
                });
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                chunk = chunk.index,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "chunk transmission failed, retrying"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    session.fail();
                    return Err(UploadError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
