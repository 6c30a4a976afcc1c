use std::collections::VecDeque;
use std::time::{Duration, Instant};

use fluentra_protocol::{ProgressSnapshot, UploadStatus};

/// Builds the snapshot for a just-acknowledged chunk.
///
/// `chunk_index` is zero-based. `bytes_uploaded` is clamped to
/// `size_bytes` so the short final chunk never over-reports.
pub fn snapshot(
    chunk_index: u32,
    total_chunks: u32,
    chunk_size_bytes: u64,
    size_bytes: u64,
) -> ProgressSnapshot {
    let current_chunk = chunk_index + 1;
    let bytes_uploaded = (u64::from(current_chunk) * chunk_size_bytes).min(size_bytes);
    let percentage = if size_bytes == 0 {
        0.0
    } else {
        bytes_uploaded as f64 / size_bytes as f64 * 100.0
    };
    let status = if current_chunk == total_chunks {
        UploadStatus::Complete
    } else {
        UploadStatus::Uploading
    };
    ProgressSnapshot {
        bytes_uploaded,
        total_bytes: size_bytes,
        percentage,
        current_chunk,
        total_chunks,
        status,
    }
}

// ---------------------------------------------------------------------------
// RateWindow
// ---------------------------------------------------------------------------

/// Transfer-rate estimate over a sliding time window.
///
/// Fed by whoever consumes progress events; one feeder, so no locking.
pub struct RateWindow {
    samples: VecDeque<(Instant, u64)>,
    window: Duration,
}

impl RateWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
        }
    }

    /// Records `bytes` transferred at the current instant.
    pub fn record(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, bytes));

        // Prune samples outside the window.
        while let Some(&(t, _)) = self.samples.front() {
            if now.duration_since(t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average speed in bytes/second within the window.
    ///
    /// Returns 0.0 with fewer than two samples.
    pub fn bytes_per_second(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        let (first, _) = self.samples[0];
        let (last, _) = self.samples[self.samples.len() - 1];
        let elapsed = last.duration_since(first);
        if elapsed.is_zero() {
            return 0.0;
        }
        let total: u64 = self.samples.iter().map(|&(_, b)| b).sum();
        total as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to transfer `remaining_bytes`; `None` at zero speed.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        if speed <= 0.0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_bytes as f64 / speed))
    }

    /// Clears all recorded samples.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
