use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use super::config::WriteMode;

/// Running counters shared between the service and its writer
#[derive(Debug, Default)]
pub(crate) struct IngestCounters {
    pub chunks_received: AtomicU64,
    pub bytes_received: AtomicU64,
    pub batches_flushed: AtomicU64,
    pub files_written: AtomicU64,
    pub write_failures: AtomicU64,
}

impl IngestCounters {
    pub fn record_chunk(&self, len: usize) {
        self.chunks_received.fetch_add(1, Ordering::SeqCst);
        self.bytes_received.fetch_add(len as u64, Ordering::SeqCst);
    }

    pub fn record_flush(&self) {
        self.batches_flushed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_write(&self) {
        self.files_written.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// Point-in-time view of an ingest service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStatus {
    /// Chunks per output file
    pub threshold: usize,

    /// Chunks waiting for the current batch to fill
    pub pending_chunks: usize,

    /// Bytes waiting for the current batch to fill
    pub pending_bytes: usize,

    /// Sequence number the next file will get
    pub next_sequence: u64,

    /// Total chunks received since startup
    pub chunks_received: u64,

    /// Total payload bytes received since startup
    pub bytes_received: u64,

    /// Batches that reached the threshold
    pub batches_flushed: u64,

    /// Files successfully written
    pub files_written: u64,

    /// Failed write attempts (including retries)
    pub write_failures: u64,

    /// Encoded batches waiting for a retry
    pub retained_artifacts: usize,

    pub write_mode: WriteMode,

    /// When the service started
    pub started_at: DateTime<Utc>,

    /// Time since startup in seconds
    pub uptime_secs: f64,
}
