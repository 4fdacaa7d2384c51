// File-backed capture device
//
// Replays an audio file's encoded bytes as a capture stream, for batch
// processing and for exercising the recorder without real hardware.
// Stopping flushes the unread remainder so a file capture always
// finalizes to the complete source file.

use crate::error::AudioError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::device::{AudioChunk, CaptureConstraints, CaptureDevice, CaptureStream};

/// Bytes delivered per chunk interval
const DEFAULT_CHUNK_BYTES: usize = 16 * 1024;

/// Capture device that reads from an audio file
pub struct FileCaptureDevice {
    path: PathBuf,
    chunk_bytes: usize,
}

impl FileCaptureDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    /// Override the number of bytes delivered per chunk interval
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    fn mime(&self) -> String {
        mime_for_extension(
            self.path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or(""),
        )
        .to_string()
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileCaptureDevice {
    async fn acquire(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AudioError::Device(format!("failed to open {}: {}", self.path.display(), e))
        })?;

        info!(
            "File capture source acquired: {} ({} bytes)",
            self.path.display(),
            bytes.len()
        );

        Ok(Box::new(FileCaptureStream {
            bytes,
            mime: self.mime(),
            chunk_bytes: self.chunk_bytes,
            control: None,
            task: None,
        }))
    }

    fn supports_mime(&self, mime: &str) -> bool {
        // Only the file's own base type; codec parameters are ignored
        let base = mime.split(';').next().unwrap_or(mime).trim();
        base.eq_ignore_ascii_case(&self.mime())
    }

    fn name(&self) -> &str {
        "file"
    }
}

enum StreamControl {
    Pause,
    Resume,
    Stop,
}

struct FileCaptureStream {
    bytes: Vec<u8>,
    mime: String,
    chunk_bytes: usize,
    control: Option<mpsc::Sender<StreamControl>>,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl CaptureStream for FileCaptureStream {
    async fn start(
        &mut self,
        _mime: &str,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, AudioError> {
        if self.task.is_some() {
            return Err(AudioError::Device("capture stream already started".into()));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (control_tx, mut control_rx) = mpsc::channel(8);
        let bytes = std::mem::take(&mut self.bytes);
        let chunk_bytes = self.chunk_bytes;

        let task = tokio::spawn(async move {
            let mut offset = 0usize;
            let mut paused = false;
            let mut ticker = tokio::time::interval(chunk_interval);

            loop {
                tokio::select! {
                    command = control_rx.recv() => match command {
                        Some(StreamControl::Pause) => paused = true,
                        Some(StreamControl::Resume) => paused = false,
                        Some(StreamControl::Stop) | None => {
                            // Final flush: deliver whatever has not been
                            // read yet, then close the channel.
                            if offset < bytes.len() {
                                let _ = chunk_tx
                                    .send(AudioChunk { data: bytes[offset..].to_vec() })
                                    .await;
                            }
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if paused || offset >= bytes.len() {
                            continue;
                        }
                        let end = (offset + chunk_bytes).min(bytes.len());
                        if chunk_tx
                            .send(AudioChunk { data: bytes[offset..end].to_vec() })
                            .await
                            .is_err()
                        {
                            warn!("Chunk receiver dropped; stopping file capture");
                            break;
                        }
                        offset = end;
                    }
                }
            }
        });

        self.control = Some(control_tx);
        self.task = Some(task);

        Ok(chunk_rx)
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        if let Some(control) = &self.control {
            control
                .send(StreamControl::Pause)
                .await
                .map_err(|_| AudioError::Device("capture stream task exited".into()))?;
        }
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), AudioError> {
        if let Some(control) = &self.control {
            control
                .send(StreamControl::Resume)
                .await
                .map_err(|_| AudioError::Device("capture stream task exited".into()))?;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(control) = self.control.take() {
            // A closed channel means the task already finished flushing
            control.send(StreamControl::Stop).await.ok();
        }
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| AudioError::Device(format!("capture task panicked: {}", e)))?;
        }
        Ok(())
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }
}

/// Map a file extension to its audio mime type
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "webm" => "audio/webm",
        "ogg" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
