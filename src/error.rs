//! Error types for the ingest pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Header parameters that cannot be represented in a PCM WAV header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("channel count must be non-zero")]
    ZeroChannels,

    #[error("bits per sample must be a non-zero multiple of 8, got {0}")]
    InvalidBitsPerSample(u16),

    /// Payload length does not fit the 32-bit RIFF size fields.
    #[error("payload of {0} bytes is too large for a WAV container")]
    DataTooLarge(u64),

    #[error("byte rate {0} does not fit in 32 bits")]
    ByteRateOverflow(u64),

    #[error("block align {0} does not fit in 16 bits")]
    BlockAlignOverflow(u64),
}

/// Bytes that are not a canonical PCM WAV header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("header truncated: {0} bytes, expected at least 44")]
    Truncated(usize),

    #[error("expected tag {expected:?} at offset {offset}")]
    BadTag { offset: usize, expected: String },

    #[error("unsupported audio format code {0}, only PCM (1) is supported")]
    UnsupportedFormat(u16),
}

/// Failures while turning a flushed batch into an output artifact.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    /// The target file already exists; artifacts are never overwritten.
    #[error("refusing to overwrite existing artifact {0}")]
    ArtifactExists(PathBuf),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background writer is no longer running")]
    WriterClosed,

    /// An existing artifact already uses the largest possible sequence number.
    #[error("no sequence number left after existing artifact {0}")]
    SequenceExhausted(PathBuf),
}

/// Result type alias using IngestError.
pub type Result<T> = std::result::Result<T, IngestError>;
