// Microphone recorder
//
// Owns the capture lifecycle: permission probe, start/pause/resume/stop,
// chunk accumulation, the elapsed-time counter, and finalization into a
// single in-memory audio object with a revocable playback URL.
//
// State machine: Idle -> RequestingPermission -> Recording <-> Paused ->
// Stopped -> Idle (discard). Start failures revert to Idle; a stream
// failure mid-session lands in Error, which discard() or a fresh start()
// recovers from. Errors are captured into recorder state and hooks and
// never escape as panics.

use crate::error::AudioError;
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::device::{CaptureConstraints, CaptureDevice, CaptureStream};
use super::playback::{BlobUrlRegistry, PlaybackHandle};

/// Capture encodings tried in order; the first one the device supports
/// wins, otherwise the fallback is requested.
pub const PREFERRED_MIME_TYPES: &[&str] = &[
    "audio/mp3",
    "audio/mpeg",
    "audio/webm;codecs=opus",
    "audio/webm",
];

/// Universally supported capture encoding
pub const FALLBACK_MIME_TYPE: &str = "audio/webm";

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    RequestingPermission,
    Recording,
    Paused,
    Stopped,
    Error,
}

/// Microphone permission, persisted for the recorder's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Unknown,
    Granted,
    Denied,
}

/// Configuration for the recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Constraints applied when acquiring the capture stream
    pub constraints: CaptureConstraints,
    /// How often the capture stream delivers a chunk
    pub chunk_interval: Duration,
    /// Ordered capture encoding preference list
    pub preferred_mime_types: Vec<String>,
    /// Encoding requested when nothing in the preference list is supported
    pub fallback_mime_type: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            chunk_interval: Duration::from_secs(1),
            preferred_mime_types: PREFERRED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            fallback_mime_type: FALLBACK_MIME_TYPE.to_string(),
        }
    }
}

pub type RecordingStartHook = Box<dyn Fn() + Send + Sync>;
pub type RecordingStopHook = Box<dyn Fn(Option<&FinalizedAudio>, Option<&str>) + Send + Sync>;
pub type RecordingErrorHook = Box<dyn Fn(&AudioError) + Send + Sync>;
pub type PermissionDeniedHook = Box<dyn Fn() + Send + Sync>;

/// Optional recorder event handlers
///
/// Each handler documents when it fires:
/// - `on_recording_start`: at most once per successfully started session
/// - `on_recording_stop`: exactly once per stop; `(None, None)` means the
///   session produced no audio (distinct from a capture error)
/// - `on_recording_error`: once per surfaced permission/device failure
/// - `on_permission_denied`: once per denied probe or failed start
#[derive(Default)]
pub struct RecorderHooks {
    pub on_recording_start: Option<RecordingStartHook>,
    pub on_recording_stop: Option<RecordingStopHook>,
    pub on_recording_error: Option<RecordingErrorHook>,
    pub on_permission_denied: Option<PermissionDeniedHook>,
}

/// A completed recording: the concatenation of every captured chunk,
/// plus its revocable playback handle. One handle exists per recording;
/// it is revoked on discard or before being replaced by a newer one.
#[derive(Debug)]
pub struct FinalizedAudio {
    /// Concatenated encoded bytes; never mutated after finalization
    pub bytes: Vec<u8>,
    /// The session's negotiated capture encoding
    pub mime_type: String,
    /// Timestamped filename whose extension reflects the encoding
    pub suggested_filename: String,
    /// Handle to the local playback URL
    pub playback: PlaybackHandle,
}

/// Microphone recorder; one live recording session at a time
pub struct Recorder {
    config: RecorderConfig,
    hooks: RecorderHooks,
    device: Arc<dyn CaptureDevice>,
    playback_urls: Arc<dyn BlobUrlRegistry>,

    state: RecorderState,
    permission: Permission,
    permission_warning: bool,
    last_error: Option<AudioError>,

    /// Seconds recorded so far; ticks while Recording, frozen while Paused
    elapsed_seconds: Arc<AtomicU64>,
    /// Chunks captured by the current session, appended by the pump task
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Negotiated encoding, fixed once recording starts
    mime_type: Option<String>,

    stream: Option<Box<dyn CaptureStream>>,
    pump_handle: Option<JoinHandle<()>>,
    ticker_handle: Option<JoinHandle<()>>,

    finalized: Option<FinalizedAudio>,
}

impl Recorder {
    pub fn new(
        config: RecorderConfig,
        hooks: RecorderHooks,
        device: Arc<dyn CaptureDevice>,
        playback_urls: Arc<dyn BlobUrlRegistry>,
    ) -> Self {
        Self {
            config,
            hooks,
            device,
            playback_urls,
            state: RecorderState::Idle,
            permission: Permission::Unknown,
            permission_warning: false,
            last_error: None,
            elapsed_seconds: Arc::new(AtomicU64::new(0)),
            chunks: Arc::new(Mutex::new(Vec::new())),
            mime_type: None,
            stream: None,
            pump_handle: None,
            ticker_handle: None,
            finalized: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn permission_warning(&self) -> bool {
        self.permission_warning
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds.load(Ordering::SeqCst)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn last_error(&self) -> Option<&AudioError> {
        self.last_error.as_ref()
    }

    /// The most recent finalized recording, if any
    pub fn finalized(&self) -> Option<&FinalizedAudio> {
        self.finalized.as_ref()
    }

    /// Probe microphone access without recording.
    ///
    /// Acquires a capture stream and immediately releases it. Never fails
    /// outward: any failure maps to `Permission::Denied`, raises the
    /// warning flag, and fires `on_permission_denied` exactly once.
    pub async fn check_permission(&mut self) {
        let previous = self.state;
        self.state = RecorderState::RequestingPermission;

        match self.device.acquire(&CaptureConstraints::default()).await {
            Ok(mut stream) => {
                // Release the probe stream right away; the hardware must
                // not stay open.
                if let Err(e) = stream.stop().await {
                    warn!("Failed to release probe stream: {}", e);
                }
                self.permission = Permission::Granted;
                self.permission_warning = false;
            }
            Err(e) => {
                error!("Microphone permission denied: {}", e);
                self.permission = Permission::Denied;
                self.permission_warning = true;
                if let Some(hook) = &self.hooks.on_permission_denied {
                    hook();
                }
            }
        }

        self.state = previous;
    }

    /// Start a new recording session.
    ///
    /// Acquiring the stream may itself (re)request permission, so a prior
    /// denial does not block the attempt. Ignored if a session is already
    /// active. On failure the recorder reverts to Idle with the warning
    /// flag raised and both the error and denial hooks fired.
    pub async fn start(&mut self) -> Result<(), AudioError> {
        if matches!(
            self.state,
            RecorderState::Recording | RecorderState::Paused | RecorderState::RequestingPermission
        ) {
            warn!("Recording already in progress");
            return Ok(());
        }

        self.state = RecorderState::RequestingPermission;

        let mut stream = match self.device.acquire(&self.config.constraints).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail_start(e)),
        };

        let requested = self.select_mime_type();
        let chunk_rx = match stream.start(&requested, self.config.chunk_interval).await {
            Ok(rx) => rx,
            Err(e) => return Err(self.fail_start(e)),
        };

        self.mime_type = Some(stream.mime_type().to_string());

        // Fresh chunk buffer, fed by the pump task until the stream's
        // channel closes after the final flush.
        self.chunks.lock().unwrap().clear();
        let chunks = Arc::clone(&self.chunks);
        self.pump_handle = Some(tokio::spawn(async move {
            let mut chunk_rx = chunk_rx;
            while let Some(chunk) = chunk_rx.recv().await {
                if chunk.data.is_empty() {
                    continue;
                }
                chunks.lock().unwrap().push(chunk.data);
            }
        }));

        self.stream = Some(stream);
        self.state = RecorderState::Recording;
        self.permission = Permission::Granted;
        self.permission_warning = false;
        self.last_error = None;
        self.start_ticker(true);

        if let Some(hook) = &self.hooks.on_recording_start {
            hook();
        }

        info!(
            "Recording started on {} ({})",
            self.device.name(),
            self.mime_type.as_deref().unwrap_or("unknown")
        );

        Ok(())
    }

    /// Pause the active recording; a no-op unless currently Recording.
    /// Buffered chunks are kept and the elapsed counter freezes.
    pub async fn pause(&mut self) -> Result<(), AudioError> {
        if self.state != RecorderState::Recording {
            return Ok(());
        }

        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.pause().await {
                return Err(self.fail_session(e));
            }
        }

        self.stop_ticker();
        self.state = RecorderState::Paused;
        info!("Recording paused");
        Ok(())
    }

    /// Resume a paused recording; a no-op unless currently Paused.
    /// The elapsed counter continues from where it froze.
    pub async fn resume(&mut self) -> Result<(), AudioError> {
        if self.state != RecorderState::Paused {
            return Ok(());
        }

        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.resume().await {
                return Err(self.fail_session(e));
            }
        }

        self.start_ticker(false);
        self.state = RecorderState::Recording;
        info!("Recording resumed");
        Ok(())
    }

    /// Stop the active recording and finalize it.
    ///
    /// Requests a final flush, releases the capture hardware, stops the
    /// timer, and waits for every buffered chunk to be delivered. A
    /// session with zero chunks finalizes to "no audio" —
    /// `on_recording_stop(None, None)` — rather than an empty file, and
    /// does not take the device-error path.
    pub async fn stop(&mut self) -> Result<(), AudioError> {
        if !matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            return Ok(());
        }

        self.stop_ticker();

        let mut stop_error = None;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop().await {
                stop_error = Some(e);
            }
        }

        // Finalization waits for the pump to drain the flushed chunks.
        if let Some(pump) = self.pump_handle.take() {
            if let Err(e) = pump.await {
                error!("Chunk pump task panicked: {}", e);
            }
        }

        if let Some(e) = stop_error {
            return Err(self.fail_session(e));
        }

        let data: Vec<u8> = {
            let mut chunks = self.chunks.lock().unwrap();
            std::mem::take(&mut *chunks).concat()
        };

        if data.is_empty() {
            warn!("No audio chunks captured");
            self.state = RecorderState::Stopped;
            self.last_error = Some(AudioError::EmptyCapture);
            if let Some(hook) = &self.hooks.on_recording_stop {
                hook(None, None);
            }
            return Ok(());
        }

        // Release the previous recording's URL before replacing it
        if let Some(previous) = self.finalized.take() {
            self.playback_urls.revoke(&previous.playback);
        }

        let mime_type = self
            .mime_type
            .clone()
            .unwrap_or_else(|| self.config.fallback_mime_type.clone());
        let playback = self.playback_urls.register(&data, &mime_type);
        let playback_url = playback.url().to_string();

        let audio = FinalizedAudio {
            suggested_filename: suggested_filename(&mime_type),
            bytes: data,
            mime_type,
            playback,
        };

        info!(
            "Recording stopped: {} ({} bytes)",
            audio.suggested_filename,
            audio.bytes.len()
        );

        self.state = RecorderState::Stopped;
        self.last_error = None;
        if let Some(hook) = &self.hooks.on_recording_stop {
            hook(Some(&audio), Some(&playback_url));
        }
        self.finalized = Some(audio);

        Ok(())
    }

    /// Discard the current session: revoke the playback URL, clear the
    /// chunk buffer and timer, and return to Idle. Idempotent; ignored
    /// while a recording is active.
    pub fn discard(&mut self) {
        if matches!(self.state, RecorderState::Recording | RecorderState::Paused) {
            warn!("Cannot discard while recording; stop first");
            return;
        }

        if let Some(audio) = self.finalized.take() {
            self.playback_urls.revoke(&audio.playback);
            info!("Recording discarded");
        }

        self.chunks.lock().unwrap().clear();
        self.elapsed_seconds.store(0, Ordering::SeqCst);
        self.mime_type = None;
        self.last_error = None;
        self.state = RecorderState::Idle;
    }

    fn select_mime_type(&self) -> String {
        for mime in &self.config.preferred_mime_types {
            if self.device.supports_mime(mime) {
                info!("Using mime type: {}", mime);
                return mime.clone();
            }
        }
        self.config.fallback_mime_type.clone()
    }

    /// Start failure: revert to Idle, raise the warning, fire both hooks
    fn fail_start(&mut self, err: AudioError) -> AudioError {
        error!("Failed to start recording: {}", err);
        self.state = RecorderState::Idle;
        self.permission = Permission::Denied;
        self.permission_warning = true;
        self.last_error = Some(err.clone());
        if let Some(hook) = &self.hooks.on_recording_error {
            hook(&err);
        }
        if let Some(hook) = &self.hooks.on_permission_denied {
            hook();
        }
        err
    }

    /// Mid-session stream failure: land in Error, keep buffered chunks
    /// until discard
    fn fail_session(&mut self, err: AudioError) -> AudioError {
        error!("Capture stream failure: {}", err);
        self.state = RecorderState::Error;
        self.last_error = Some(err.clone());
        if let Some(hook) = &self.hooks.on_recording_error {
            hook(&err);
        }
        err
    }

    fn start_ticker(&mut self, reset: bool) {
        if reset {
            self.elapsed_seconds.store(0, Ordering::SeqCst);
        }

        let elapsed = Arc::clone(&self.elapsed_seconds);
        self.ticker_handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop_ticker();
        if let Some(pump) = self.pump_handle.take() {
            pump.abort();
        }
        if let Some(audio) = self.finalized.take() {
            self.playback_urls.revoke(&audio.playback);
        }
    }
}

/// Format an elapsed-seconds counter as zero-padded `mm:ss`
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Timestamped filename for a finalized recording, with an extension
/// matching the negotiated encoding
fn suggested_filename(mime_type: &str) -> String {
    format!(
        "recording-{}{}",
        Utc::now().format("%Y-%m-%dT%H-%M-%SZ"),
        extension_for_mime(mime_type)
    )
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    if mime_type.contains("mp3") || mime_type.contains("mpeg") {
        ".mp3"
    } else if mime_type.contains("wav") {
        ".wav"
    } else {
        ".webm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_pads_minutes_and_seconds() {
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(5), "00:05");
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(600), "10:00");
    }

    #[test]
    fn test_format_time_past_one_hour_keeps_counting_minutes() {
        assert_eq!(format_time(3661), "61:01");
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("audio/mp3"), ".mp3");
        assert_eq!(extension_for_mime("audio/mpeg"), ".mp3");
        assert_eq!(extension_for_mime("audio/wav"), ".wav");
        assert_eq!(extension_for_mime("audio/webm;codecs=opus"), ".webm");
        assert_eq!(extension_for_mime("audio/ogg"), ".webm");
    }

    #[test]
    fn test_suggested_filename_carries_extension() {
        let name = suggested_filename("audio/mpeg");
        assert!(name.starts_with("recording-"));
        assert!(name.ends_with(".mp3"));
    }

    #[test]
    fn test_default_config_preference_order() {
        let config = RecorderConfig::default();

        assert_eq!(config.preferred_mime_types[0], "audio/mp3");
        assert_eq!(config.fallback_mime_type, "audio/webm");
        assert_eq!(config.chunk_interval, Duration::from_secs(1));
    }
}
