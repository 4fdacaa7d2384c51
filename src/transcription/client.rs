use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::records::{TranscriptionRecord, UploadSettings};
use crate::audio::NormalizedAudio;
use crate::config::TranscriptionConfig;

/// Envelope the transcription API wraps every response in
#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    status: String,
    message: Option<String>,
    data: Option<TranscriptionRecord>,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    status: String,
    message: Option<String>,
    #[serde(default)]
    data: Vec<TranscriptionRecord>,
}

/// HTTP client for the transcription API
///
/// Transport and authentication beyond the bearer header are the
/// service's responsibility; this client only speaks its envelope.
pub struct TranscriptionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TranscriptionClient {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Upload normalized audio with its settings payload.
    ///
    /// Multipart form: a `file` part carrying the audio bytes with
    /// filename and mime type, and a `settings` part carrying the JSON
    /// payload.
    pub async fn upload(
        &self,
        audio: &NormalizedAudio,
        settings: &UploadSettings,
    ) -> Result<TranscriptionRecord> {
        info!(
            "Uploading {} ({} bytes) for transcription",
            audio.filename,
            audio.bytes.len()
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.bytes.clone())
                    .file_name(audio.filename.clone())
                    .mime_str(&audio.mime_type)?,
            )
            .text("settings", serde_json::to_string(settings)?);

        let mut request = self
            .http
            .post(format!("{}/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.context("Failed to send upload request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Transcription API error ({}): {}", status, error_text);
        }

        let envelope: UploadEnvelope = response
            .json()
            .await
            .context("Failed to parse upload response")?;

        if envelope.status != "success" {
            anyhow::bail!(
                "Upload failed: {}",
                envelope.message.unwrap_or_else(|| "unknown reason".to_string())
            );
        }

        let record = envelope
            .data
            .context("Upload response contained no transcription record")?;

        info!("Upload accepted: transcription {}", record.id);
        Ok(record)
    }

    /// Fetch all transcriptions
    pub async fn list(&self) -> Result<Vec<TranscriptionRecord>> {
        let mut request = self.http.get(format!("{}/transcriptions", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.context("Failed to fetch transcriptions")?;

        if !response.status().is_success() {
            anyhow::bail!("Transcription API error ({})", response.status());
        }

        let envelope: ListEnvelope = response
            .json()
            .await
            .context("Failed to parse transcription list")?;

        if envelope.status != "success" {
            anyhow::bail!(
                "Listing failed: {}",
                envelope.message.unwrap_or_else(|| "unknown reason".to_string())
            );
        }

        Ok(envelope.data)
    }

    /// Delete a transcription by id
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut request = self
            .http
            .delete(format!("{}/transcriptions/{}", self.base_url, id));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.context("Failed to delete transcription")?;

        if !response.status().is_success() {
            anyhow::bail!("Transcription API error ({})", response.status());
        }

        info!("Deleted transcription {}", id);
        Ok(())
    }
}
