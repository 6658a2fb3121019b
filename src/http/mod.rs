//! HTTP API for streaming and offline recognition
//!
//! - POST /transcribe - offline recognition of a whole file
//! - POST /transcribe/streaming - start a streaming session
//! - POST /transcribe/streaming/chunk - send an audio chunk
//! - POST /transcribe/streaming/finalize - flush and close a session
//! - GET /health - health check
//! - GET / - service info

mod auth;
mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
