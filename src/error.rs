use thiserror::Error;

/// Errors raised by the capture and conversion pipeline.
///
/// Permission and device failures are recoverable: the recorder re-arms
/// itself and the user may retry. Decode and encode failures are terminal
/// for the affected conversion job only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Microphone access was denied or revoked by the user.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The capture device failed during acquisition or recording.
    #[error("capture device failure: {0}")]
    Device(String),

    /// Recording stopped before any audio was captured. Reported apart
    /// from `Device` so callers can treat it as a timing condition rather
    /// than a hardware fault.
    #[error("recording stopped with no captured audio")]
    EmptyCapture,

    /// The conversion input could not be decoded (corrupt or unsupported).
    #[error("failed to decode input audio: {0}")]
    Decode(String),

    /// Re-encoding the decoded samples failed. Should not occur for valid
    /// decoded input; treated as a defect when seen.
    #[error("failed to encode output audio: {0}")]
    Encode(String),

    /// A conversion job is already in flight; new jobs are rejected, not
    /// queued.
    #[error("a conversion is already in progress")]
    ConversionBusy,
}
