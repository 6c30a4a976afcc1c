use std::time::Duration;

/// Size of one upload chunk (1 MiB).
///
/// The ingestion endpoint accepts chunks up to this size; the final chunk
/// of a file may be shorter.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Maximum accepted recording size (100 MiB).
pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// Audio MIME types accepted for upload.
///
/// `audio/mp3` is kept alongside `audio/mpeg` because some recorders tag
/// MP3 files with the nonstandard name.
pub const ALLOWED_AUDIO_TYPES: [&str; 4] =
    ["audio/mp3", "audio/mpeg", "audio/wav", "audio/m4a"];

/// Timeout for the session initiation request.
pub const INITIATE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single chunk request.
///
/// Chunk posts carry up to [`DEFAULT_CHUNK_SIZE`] bytes and can be slow on
/// poor uplinks; the bound makes a stalled request surface as a chunk
/// failure instead of hanging the whole attempt.
pub const CHUNK_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transmission attempts per chunk (first try plus retries).
pub const MAX_CHUNK_ATTEMPTS: u32 = 3;
