use crate::audio::{CaptureConstraints, CaptureSource};
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Capture source kind: "microphone" or "file"
    pub source: String,
    /// Source file for the "file" capture source
    pub file_path: Option<String>,
    pub sample_rate: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// How often the capture stream delivers a chunk
    pub chunk_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    /// Base URL of the transcription API
    pub api_base_url: String,
    /// Bearer token, if the API requires one
    pub api_key: Option<String>,
    /// Default transcription language
    pub language: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl CaptureConfig {
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            echo_cancellation: self.echo_cancellation,
            noise_suppression: self.noise_suppression,
            sample_rate: self.sample_rate,
        }
    }

    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms)
    }

    pub fn source(&self) -> Result<CaptureSource> {
        match self.source.as_str() {
            "microphone" => Ok(CaptureSource::Microphone),
            "file" => {
                let path = self.file_path.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("capture.file_path is required for the file source")
                })?;
                Ok(CaptureSource::File(path.into()))
            }
            other => anyhow::bail!("Unknown capture source: {}", other),
        }
    }
}
