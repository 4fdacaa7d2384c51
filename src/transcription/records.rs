use serde::{Deserialize, Serialize};

/// Opaque settings payload sent alongside an upload
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Processing state of a transcription on the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One transcription as reported by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRecord {
    pub id: String,
    pub filename: String,
    /// Duration as reported by the service ("mm:ss" or "hh:mm:ss")
    pub duration: String,
    pub file_size: String,
    pub status: TranscriptionStatus,
    #[serde(default)]
    pub transcription_text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
