use super::state::AppState;
use crate::audio::{
    format_time, BlobUrlRegistry, ConversionInput, ConversionStatus, Permission, RecorderState,
};
use crate::error::AudioError;
use crate::transcription::UploadSettings;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub permission: Permission,
    pub warning: bool,
}

#[derive(Debug, Serialize)]
pub struct CaptureStatusResponse {
    pub state: RecorderState,
    pub permission: Permission,
    pub warning: bool,
    pub elapsed_seconds: u64,
    /// Elapsed time formatted as mm:ss
    pub elapsed_display: String,
    pub has_audio: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordedAudioInfo {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub playback_url: String,
}

#[derive(Debug, Serialize)]
pub struct StopCaptureResponse {
    pub status: String,
    /// Absent when the session captured no audio
    pub audio: Option<RecordedAudioInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    /// Path of an externally selected file; when absent, the last
    /// finalized recording is converted
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_seconds: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Capture Handlers
// ============================================================================

/// POST /capture/permission
/// Probe microphone access without recording
pub async fn check_permission(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;
    recorder.check_permission().await;

    (
        StatusCode::OK,
        Json(PermissionResponse {
            permission: recorder.permission(),
            warning: recorder.permission_warning(),
        }),
    )
}

/// POST /capture/start
/// Start a new recording session
pub async fn start_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;

    match recorder.start().await {
        Ok(()) => {
            info!("Capture started via HTTP");
            (StatusCode::OK, Json(serde_json::json!({ "status": "recording" }))).into_response()
        }
        Err(e) => {
            error!("Failed to start capture: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to start recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /capture/pause
pub async fn pause_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;

    match recorder.pause().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "paused" }))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to pause recording: {}", e),
            }),
        )
            .into_response(),
    }
}

/// POST /capture/resume
pub async fn resume_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;

    match recorder.resume().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "recording" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to resume recording: {}", e),
            }),
        )
            .into_response(),
    }
}

/// POST /capture/stop
/// Stop the active recording and finalize it
pub async fn stop_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;

    if let Err(e) = recorder.stop().await {
        error!("Failed to stop capture: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to stop recording: {}", e),
            }),
        )
            .into_response();
    }

    let audio = recorder.finalized().map(|audio| RecordedAudioInfo {
        filename: audio.suggested_filename.clone(),
        mime_type: audio.mime_type.clone(),
        size_bytes: audio.bytes.len(),
        playback_url: audio.playback.url().to_string(),
    });

    let status = if audio.is_some() { "stopped" } else { "no_audio" };

    (
        StatusCode::OK,
        Json(StopCaptureResponse {
            status: status.to_string(),
            audio,
        }),
    )
        .into_response()
}

/// POST /capture/discard
/// Drop the current session and release its playback URL
pub async fn discard_capture(State(state): State<AppState>) -> impl IntoResponse {
    let mut recorder = state.recorder.lock().await;
    recorder.discard();

    (StatusCode::OK, Json(serde_json::json!({ "status": "idle" })))
}

/// GET /capture/status
pub async fn capture_status(State(state): State<AppState>) -> impl IntoResponse {
    let recorder = state.recorder.lock().await;
    let elapsed = recorder.elapsed_seconds();

    (
        StatusCode::OK,
        Json(CaptureStatusResponse {
            state: recorder.state(),
            permission: recorder.permission(),
            warning: recorder.permission_warning(),
            elapsed_seconds: elapsed,
            elapsed_display: format_time(elapsed),
            has_audio: recorder.finalized().is_some(),
            error: recorder.last_error().map(|e| e.to_string()),
        }),
    )
}

/// GET /playback/:id
/// Serve the audio behind a registered playback URL
pub async fn playback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.playback.resolve(id) {
        Some(entry) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, entry.mime_type.clone())],
            entry.bytes.as_slice().to_vec(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No playback audio registered for {}", id),
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// Conversion Handlers
// ============================================================================

/// POST /conversions
/// Normalize the last recording (or a selected file) into PCM16 WAV
pub async fn convert_audio(
    State(state): State<AppState>,
    request: Option<Json<ConvertRequest>>,
) -> impl IntoResponse {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let input = match request.path {
        Some(path) => match ConversionInput::from_file(&path).await {
            Ok(input) => input,
            Err(e) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
                    .into_response();
            }
        },
        None => {
            let recorder = state.recorder.lock().await;
            match recorder.finalized() {
                Some(audio) => ConversionInput::from(audio),
                None => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(ErrorResponse {
                            error: "No finalized recording to convert".to_string(),
                        }),
                    )
                        .into_response();
                }
            }
        }
    };

    match state.converter.convert(input).await {
        Ok(audio) => (
            StatusCode::OK,
            Json(ConvertResponse {
                filename: audio.filename,
                mime_type: audio.mime_type,
                size_bytes: audio.bytes.len(),
                sample_rate: audio.sample_rate,
                channels: audio.channels,
                duration_seconds: audio.duration_seconds,
            }),
        )
            .into_response(),
        Err(AudioError::ConversionBusy) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: AudioError::ConversionBusy.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Conversion failed: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /conversions/status
pub async fn conversion_status(State(state): State<AppState>) -> Json<ConversionStatus> {
    Json(state.converter.status())
}

// ============================================================================
// Transcription Handlers
// ============================================================================

/// POST /transcriptions
/// Upload the converted audio to the transcription service
pub async fn upload_transcription(
    State(state): State<AppState>,
    request: Option<Json<UploadRequest>>,
) -> impl IntoResponse {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let audio = match state.converter.converted() {
        Some(audio) => audio,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "No converted audio available to upload".to_string(),
                }),
            )
                .into_response();
        }
    };

    let settings = UploadSettings {
        language: request.language.or_else(|| state.default_language.clone()),
    };

    match state.transcription.upload(&audio, &settings).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => {
            error!("Upload failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Upload failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /transcriptions
pub async fn list_transcriptions(State(state): State<AppState>) -> impl IntoResponse {
    match state.transcription.list().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => {
            error!("Failed to list transcriptions: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Failed to list transcriptions: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// DELETE /transcriptions/:id
pub async fn delete_transcription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.transcription.delete(&id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "deleted", "id": id })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to delete transcription {}: {}", id, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Failed to delete transcription: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
