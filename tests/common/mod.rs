// Shared test doubles for the capture and decode capability traits.
//
// These satisfy the same contracts as the production implementations so
// the recorder and converter can be exercised without real hardware or
// real codecs.

#![allow(dead_code)]

use scribeflow::audio::{
    AudioChunk, AudioDecoder, CaptureConstraints, CaptureDevice, CaptureStream, DecodedAudio,
};
use scribeflow::AudioError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Capture device scripted with canned chunks
pub struct ScriptedDevice {
    chunks: Vec<Vec<u8>>,
    supported: Vec<String>,
    deny: bool,
    pub acquisitions: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
}

impl ScriptedDevice {
    /// A device that grants access and delivers the given chunks
    pub fn granting(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            supported: vec![
                "audio/webm;codecs=opus".to_string(),
                "audio/webm".to_string(),
            ],
            deny: false,
            acquisitions: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A device that denies every acquisition
    pub fn denying() -> Self {
        Self {
            chunks: Vec::new(),
            supported: Vec::new(),
            deny: true,
            acquisitions: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Override the supported encodings
    pub fn with_supported(mut self, supported: &[&str]) -> Self {
        self.supported = supported.iter().map(|m| m.to_string()).collect();
        self
    }
}

#[async_trait::async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn acquire(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(AudioError::PermissionDenied);
        }

        Ok(Box::new(ScriptedStream {
            chunks: self.chunks.clone(),
            mime: String::new(),
            releases: Arc::clone(&self.releases),
        }))
    }

    fn supports_mime(&self, mime: &str) -> bool {
        self.supported.iter().any(|m| m == mime)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Stream that delivers its scripted chunks immediately on start
pub struct ScriptedStream {
    chunks: Vec<Vec<u8>>,
    mime: String,
    releases: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl CaptureStream for ScriptedStream {
    async fn start(
        &mut self,
        mime: &str,
        _chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, AudioError> {
        self.mime = mime.to_string();

        let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
        for data in self.chunks.drain(..) {
            tx.send(AudioChunk { data }).await.ok();
        }
        // Dropping the sender closes the channel once the buffered
        // chunks are drained, standing in for the final flush.
        Ok(rx)
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn mime_type(&self) -> &str {
        &self.mime
    }
}

/// Decoder returning a fixed outcome
pub struct StubDecoder {
    outcome: Result<DecodedAudio, AudioError>,
    pub calls: AtomicUsize,
}

impl StubDecoder {
    pub fn succeeding(audio: DecodedAudio) -> Self {
        Self {
            outcome: Ok(audio),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: AudioError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }
}

impl AudioDecoder for StubDecoder {
    fn decode(
        &self,
        _bytes: &[u8],
        _extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Decoder scripted with one outcome per call, in order
pub struct SequencedDecoder {
    script: Mutex<Vec<Result<DecodedAudio, AudioError>>>,
}

impl SequencedDecoder {
    pub fn new(outcomes: Vec<Result<DecodedAudio, AudioError>>) -> Self {
        let mut script = outcomes;
        script.reverse(); // pop from the back in call order
        Self {
            script: Mutex::new(script),
        }
    }
}

impl AudioDecoder for SequencedDecoder {
    fn decode(
        &self,
        _bytes: &[u8],
        _extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(AudioError::Decode("decoder script exhausted".to_string())))
    }
}

/// Decoder that blocks until released, for overlap tests
pub struct GatedDecoder {
    gate: Mutex<std::sync::mpsc::Receiver<()>>,
    output: DecodedAudio,
}

impl GatedDecoder {
    pub fn new(output: DecodedAudio) -> (Self, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (
            Self {
                gate: Mutex::new(rx),
                output,
            },
            tx,
        )
    }
}

impl AudioDecoder for GatedDecoder {
    fn decode(
        &self,
        _bytes: &[u8],
        _extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        self.gate.lock().unwrap().recv().ok();
        Ok(self.output.clone())
    }
}

/// One second of mono silence at 16kHz
pub fn mono_silence() -> DecodedAudio {
    DecodedAudio {
        samples: vec![0.0; 16000],
        sample_rate: 16000,
        channels: 1,
    }
}
