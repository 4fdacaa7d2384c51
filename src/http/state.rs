use crate::audio::{BlobUrlRegistry, Converter, Recorder};
use crate::transcription::TranscriptionClient;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single recorder instance (one live session at a time)
    pub recorder: Arc<Mutex<Recorder>>,
    /// The single converter instance (one job in flight at a time)
    pub converter: Arc<Converter>,
    /// Registry backing /playback/{id} URLs
    pub playback: Arc<dyn BlobUrlRegistry>,
    /// Upload collaborator
    pub transcription: Arc<TranscriptionClient>,
    /// Default language for upload settings
    pub default_language: Option<String>,
}

impl AppState {
    pub fn new(
        recorder: Recorder,
        converter: Converter,
        playback: Arc<dyn BlobUrlRegistry>,
        transcription: TranscriptionClient,
        default_language: Option<String>,
    ) -> Self {
        Self {
            recorder: Arc::new(Mutex::new(recorder)),
            converter: Arc::new(converter),
            playback,
            transcription: Arc::new(transcription),
            default_language,
        }
    }
}
