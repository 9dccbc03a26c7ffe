use crate::ingest::IngestService;
use std::sync::Arc;

/// Default request body limit (16 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one accumulation pipeline every client feeds
    pub ingest: Arc<IngestService>,

    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(ingest: Arc<IngestService>) -> Self {
        Self {
            ingest,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
