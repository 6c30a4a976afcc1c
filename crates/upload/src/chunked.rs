use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use fluentra_protocol::constants::DEFAULT_CHUNK_SIZE;

use crate::UploadError;
use crate::types::Chunk;

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Fixed-size split of a byte range into chunks.
///
/// Pure arithmetic — the plan knows nothing about files or transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    size_bytes: u64,
    chunk_size_bytes: u64,
}

impl ChunkPlan {
    /// Builds a plan. A zero `chunk_size_bytes` falls back to
    /// [`DEFAULT_CHUNK_SIZE`] (1 MiB).
    pub fn new(size_bytes: u64, chunk_size_bytes: u64) -> Self {
        let chunk_size_bytes = if chunk_size_bytes == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size_bytes
        };
        Self {
            size_bytes,
            chunk_size_bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_bytes
    }

    /// `ceil(size / chunk_size)`; zero for an empty range.
    pub fn total_chunks(&self) -> u32 {
        self.size_bytes.div_ceil(self.chunk_size_bytes) as u32
    }

    /// Byte span `(offset, len)` of chunk `index`, with the final span
    /// clamped to the end of the range. `None` past the last chunk, so a
    /// zero-length tail chunk never exists.
    pub fn span(&self, index: u32) -> Option<(u64, usize)> {
        let offset = u64::from(index) * self.chunk_size_bytes;
        if offset >= self.size_bytes {
            return None;
        }
        let end = (offset + self.chunk_size_bytes).min(self.size_bytes);
        Some((offset, (end - offset) as usize))
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file as a sequence of fixed-size chunks with SHA-256 checksums.
#[derive(Debug)]
pub struct ChunkReader {
    file: std::fs::File,
    plan: ChunkPlan,
    next_index: u32,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// The plan is derived from the file's size at open time; the file
    /// must not change for the duration of the upload.
    pub fn open(path: &Path, chunk_size_bytes: u64) -> Result<Self, UploadError> {
        let file = std::fs::File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file,
            plan: ChunkPlan::new(size, chunk_size_bytes),
            next_index: 0,
        })
    }

    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }

    /// Reads the next chunk. Returns `None` after the last one.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, UploadError> {
        let Some((offset, len)) = self.plan.span(self.next_index) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;

        let chunk = Chunk {
            index: self.next_index,
            offset,
            checksum: checksum_bytes(&buf),
            data: buf,
        };
        self.next_index += 1;
        Ok(Some(chunk))
    }
}
