//! HTTP control surface for the capture and conversion pipeline
//!
//! - POST /capture/permission - Probe microphone access
//! - POST /capture/start|pause|resume|stop|discard - Recording control
//! - GET /capture/status - Recorder state snapshot
//! - GET /playback/:id - Local playback preview
//! - POST /conversions - Normalize audio for upload
//! - GET /conversions/status - Conversion job state
//! - POST|GET /transcriptions, DELETE /transcriptions/:id - Upload client
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
