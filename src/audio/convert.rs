// Audio conversion pipeline
//
// Normalizes recorded or user-selected audio into the canonical upload
// encoding (PCM16 WAV) through the injected decode capability. At most
// one job runs at a time; a second request is rejected, not queued.
// Progress checkpoints: 20 decode-start, 40 decode-done, 80 encode-done,
// 100 finalize-done — strictly monotone within a job.

use crate::error::AudioError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::decoder::AudioDecoder;
use super::recorder::FinalizedAudio;
use super::wav::encode_pcm16_wav;

/// Mime type of the canonical upload encoding
pub const NORMALIZED_MIME_TYPE: &str = "audio/wav";

/// Audio handed to the converter: a finalized recording or an externally
/// selected file
#[derive(Debug, Clone)]
pub struct ConversionInput {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl ConversionInput {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Read an externally selected file, bypassing the recorder entirely
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AudioError::Decode(format!("failed to read {}: {}", path.display(), e)))?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        Ok(Self { bytes, filename })
    }

    fn extension_hint(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string())
    }
}

impl From<&FinalizedAudio> for ConversionInput {
    fn from(audio: &FinalizedAudio) -> Self {
        Self {
            bytes: audio.bytes.clone(),
            filename: audio.suggested_filename.clone(),
        }
    }
}

/// Audio in the canonical upload encoding
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    /// PCM16 WAV bytes
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Input filename with its extension replaced by `.wav`
    pub filename: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_seconds: f64,
}

pub type ConversionProgressHook = Box<dyn Fn(u8) + Send + Sync>;
pub type ConversionEndHook = Box<dyn Fn(Option<&NormalizedAudio>) + Send + Sync>;

/// Optional converter event handlers
///
/// - `on_conversion_progress`: once per checkpoint, strictly increasing
///   within a job, 100 on success
/// - `on_conversion_end`: exactly once per started job; `None` on failure.
///   Busy-rejected requests never fire either hook.
#[derive(Default)]
pub struct ConverterHooks {
    pub on_conversion_progress: Option<ConversionProgressHook>,
    pub on_conversion_end: Option<ConversionEndHook>,
}

/// Snapshot of the converter's observable job state
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversionStatus {
    pub converting: bool,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Default)]
struct ConverterState {
    progress: u8,
    last_error: Option<AudioError>,
    converted: Option<NormalizedAudio>,
}

/// Audio converter; at most one job in flight
pub struct Converter {
    decoder: Arc<dyn AudioDecoder>,
    hooks: ConverterHooks,
    in_flight: AtomicBool,
    state: Mutex<ConverterState>,
}

impl Converter {
    pub fn new(decoder: Arc<dyn AudioDecoder>, hooks: ConverterHooks) -> Self {
        Self {
            decoder,
            hooks,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(ConverterState::default()),
        }
    }

    pub fn is_converting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The most recent successful conversion, if any
    pub fn converted(&self) -> Option<NormalizedAudio> {
        self.state.lock().unwrap().converted.clone()
    }

    pub fn status(&self) -> ConversionStatus {
        let state = self.state.lock().unwrap();
        ConversionStatus {
            converting: self.is_converting(),
            progress: state.progress,
            error: state.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    /// Normalize `input` into PCM16 WAV.
    ///
    /// Rejects with `ConversionBusy` if a job is already in flight,
    /// leaving all state untouched. On failure the job's error replaces
    /// any previously converted output; the input itself is never
    /// modified, and no retry happens automatically.
    pub async fn convert(&self, input: ConversionInput) -> Result<NormalizedAudio, AudioError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Conversion rejected: a job is already in progress");
            return Err(AudioError::ConversionBusy);
        }

        let result = self.run_job(input).await;

        {
            let mut state = self.state.lock().unwrap();
            match &result {
                Ok(audio) => {
                    state.converted = Some(audio.clone());
                    state.last_error = None;
                }
                Err(e) => {
                    // Partial output is discarded, never exposed
                    state.converted = None;
                    state.last_error = Some(e.clone());
                }
            }
            state.progress = 0;
        }
        self.in_flight.store(false, Ordering::SeqCst);

        match &result {
            Ok(audio) => {
                if let Some(hook) = &self.hooks.on_conversion_end {
                    hook(Some(audio));
                }
            }
            Err(e) => {
                warn!("Conversion failed: {}", e);
                if let Some(hook) = &self.hooks.on_conversion_end {
                    hook(None);
                }
            }
        }

        result
    }

    async fn run_job(&self, input: ConversionInput) -> Result<NormalizedAudio, AudioError> {
        {
            let mut state = self.state.lock().unwrap();
            state.progress = 0;
            state.converted = None;
            state.last_error = None;
        }

        info!(
            "Starting audio conversion: {} ({} bytes)",
            input.filename,
            input.bytes.len()
        );

        self.set_progress(20); // decode starting

        let decoder = Arc::clone(&self.decoder);
        let hint = input.extension_hint();
        let bytes = input.bytes;
        let decoded = tokio::task::spawn_blocking(move || decoder.decode(&bytes, hint.as_deref()))
            .await
            .map_err(|e| AudioError::Decode(format!("decode task failed: {}", e)))??;

        if decoded.samples.is_empty() {
            return Err(AudioError::Decode("no audio samples decoded from input".into()));
        }

        self.set_progress(40); // decode done

        let wav_bytes = encode_pcm16_wav(&decoded)?;

        self.set_progress(80); // encode done

        let audio = NormalizedAudio {
            bytes: wav_bytes,
            mime_type: NORMALIZED_MIME_TYPE.to_string(),
            filename: with_wav_extension(&input.filename),
            sample_rate: decoded.sample_rate,
            channels: decoded.channels,
            duration_seconds: decoded.duration_seconds(),
        };

        self.set_progress(100); // finalized

        info!(
            "Conversion complete: {} ({} bytes, {}Hz, {} channels, {:.2}s)",
            audio.filename,
            audio.bytes.len(),
            audio.sample_rate,
            audio.channels,
            audio.duration_seconds
        );

        Ok(audio)
    }

    /// Advance the progress checkpoint; never moves backwards within a job
    fn set_progress(&self, percent: u8) {
        {
            let mut state = self.state.lock().unwrap();
            if percent <= state.progress {
                return;
            }
            state.progress = percent;
        }
        if let Some(hook) = &self.hooks.on_conversion_progress {
            hook(percent);
        }
    }
}

/// Replace a filename's extension with `.wav`
fn with_wav_extension(filename: &str) -> String {
    Path::new(filename)
        .with_extension("wav")
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_wav_extension_replaces_any_extension() {
        assert_eq!(with_wav_extension("clip.webm"), "clip.wav");
        assert_eq!(with_wav_extension("voice memo.m4a"), "voice memo.wav");
        assert_eq!(with_wav_extension("take.one.mp3"), "take.one.wav");
    }

    #[test]
    fn test_with_wav_extension_handles_missing_extension() {
        assert_eq!(with_wav_extension("memo"), "memo.wav");
    }

    #[test]
    fn test_input_extension_hint() {
        let input = ConversionInput::new(vec![], "clip.WEBM");
        assert_eq!(input.extension_hint().as_deref(), Some("WEBM"));

        let input = ConversionInput::new(vec![], "memo");
        assert_eq!(input.extension_hint(), None);
    }
}
