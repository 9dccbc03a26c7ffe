pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod ingest;

pub use audio::{
    decode_header, encode_container, encode_header, AudioFile, WavFormat, WavHeader, HEADER_LEN,
};
pub use config::Config;
pub use error::{DecodeError, EncodeError, IngestError};
pub use http::{create_router, Ack, AppState};
pub use ingest::{
    Accumulator, ArtifactSink, FileSink, Flush, FlushResult, IngestOptions, IngestOutcome,
    IngestService, IngestStatus, WriteFailurePolicy, WriteMode,
};
