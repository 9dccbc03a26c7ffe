use serde::{Deserialize, Serialize};

use super::accumulator::DEFAULT_THRESHOLD;
use crate::audio::WavFormat;

/// Retry queue length before failed batches are dropped
pub const DEFAULT_MAX_RETAINED: usize = 16;

/// How flushed batches reach the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// The request that completes a batch waits for the file to be written.
    /// A success response means the artifact is on disk.
    #[default]
    Inline,

    /// Batches are queued to a writer task and the request returns immediately.
    /// A success response only means the batch was accepted; write errors are logged.
    Background,
}

/// What happens to an encoded batch whose write failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteFailurePolicy {
    /// Keep it (with its sequence number) and retry before every later write,
    /// up to `max_retained` batches; past that it is dropped like `Drop`
    #[default]
    Retain,

    /// Log and discard it
    Drop,
}

/// Configuration for an ingest service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Chunks per output file
    pub threshold: usize,

    /// Layout written into every header
    pub format: WavFormat,

    pub write_mode: WriteMode,

    pub on_write_failure: WriteFailurePolicy,

    /// Cap on the retry queue under `Retain`
    pub max_retained: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            format: WavFormat::default(), // 16kHz, 16-bit, mono
            write_mode: WriteMode::Inline,
            on_write_failure: WriteFailurePolicy::Retain,
            max_retained: DEFAULT_MAX_RETAINED,
        }
    }
}
