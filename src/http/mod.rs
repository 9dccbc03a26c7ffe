//! HTTP API for audio upload
//!
//! - POST /api - Upload one raw PCM chunk
//! - GET /api/status - Accumulation state and counters
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::Ack;
pub use routes::create_router;
pub use state::{AppState, DEFAULT_MAX_BODY_BYTES};
