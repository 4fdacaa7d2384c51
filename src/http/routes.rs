use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Capture control
        .route("/capture/permission", post(handlers::check_permission))
        .route("/capture/start", post(handlers::start_capture))
        .route("/capture/pause", post(handlers::pause_capture))
        .route("/capture/resume", post(handlers::resume_capture))
        .route("/capture/stop", post(handlers::stop_capture))
        .route("/capture/discard", post(handlers::discard_capture))
        .route("/capture/status", get(handlers::capture_status))
        // Local playback preview
        .route("/playback/:id", get(handlers::playback))
        // Conversion
        .route("/conversions", post(handlers::convert_audio))
        .route("/conversions/status", get(handlers::conversion_status))
        // Transcription service proxy
        .route(
            "/transcriptions",
            post(handlers::upload_transcription).get(handlers::list_transcriptions),
        )
        .route("/transcriptions/:id", delete(handlers::delete_transcription))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
