//! Chunk accumulation and WAV persistence
//!
//! This module provides the `IngestService` that manages:
//! - Buffering raw PCM chunks until a batch is full
//! - Encoding each batch as a WAV container
//! - Writing numbered output files, inline or from a background task
//! - Retaining failed writes for retry

mod accumulator;
mod config;
mod persist;
mod service;
mod stats;
mod writer;

pub use accumulator::{Accumulator, Flush, FlushResult, DEFAULT_THRESHOLD};
pub use config::{IngestOptions, WriteFailurePolicy, WriteMode, DEFAULT_MAX_RETAINED};
pub use persist::EncodedArtifact;
pub use service::{IngestOutcome, IngestService};
pub use stats::IngestStatus;
pub use writer::{artifact_file_name, parse_artifact_sequence, ArtifactSink, FileSink};
