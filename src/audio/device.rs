use crate::error::AudioError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// One interval's worth of encoded audio bytes delivered by an active
/// capture stream.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Raw encoded bytes in the stream's negotiated format
    pub data: Vec<u8>,
}

/// Constraints applied when acquiring a capture stream
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Cancel acoustic echo picked up from playback
    pub echo_cancellation: bool,
    /// Suppress steady background noise
    pub noise_suppression: bool,
    /// Target capture sample rate in Hz
    pub sample_rate: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            sample_rate: 16000, // 16kHz for speech transcription
        }
    }
}

/// Capture device capability
///
/// Abstracts over whatever actually produces encoded audio:
/// - a platform microphone backend
/// - a file replayed as a capture stream (testing/batch processing)
/// - scripted doubles in tests
///
/// Acquiring a stream is where permission is granted or denied; a denial
/// or hardware failure is reported as an error and never panics.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire a capture stream with the given constraints.
    ///
    /// May prompt the user for permission; the prompt can block
    /// indefinitely pending user action.
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, AudioError>;

    /// Whether the device can encode into the given mime type
    fn supports_mime(&self, mime: &str) -> bool;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// An acquired capture stream
///
/// Chunks are delivered through the receiver returned by `start` until the
/// stream is stopped; `stop` flushes any buffered data, releases the
/// hardware, and closes the channel once the final chunk is out.
#[async_trait::async_trait]
pub trait CaptureStream: Send {
    /// Begin delivering encoded chunks at roughly `chunk_interval`
    /// boundaries, encoded as `mime` if the stream supports it.
    async fn start(
        &mut self,
        mime: &str,
        chunk_interval: Duration,
    ) -> Result<mpsc::Receiver<AudioChunk>, AudioError>;

    /// Suspend chunk delivery without losing buffered data
    async fn pause(&mut self) -> Result<(), AudioError>;

    /// Resume chunk delivery after a pause
    async fn resume(&mut self) -> Result<(), AudioError>;

    /// Flush buffered data and release the capture hardware
    async fn stop(&mut self) -> Result<(), AudioError>;

    /// The actual negotiated encoding, fixed for the stream's lifetime.
    /// Valid once `start` has returned.
    fn mime_type(&self) -> &str;
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Platform microphone input
    Microphone,
    /// File input (for testing/batch processing)
    File(PathBuf),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device for the configured source
    pub fn create(source: CaptureSource) -> anyhow::Result<std::sync::Arc<dyn CaptureDevice>> {
        match source {
            CaptureSource::Microphone => {
                anyhow::bail!(
                    "Microphone capture requires a platform audio backend, \
                    which this build does not include. Configure a file \
                    capture source instead."
                )
            }

            CaptureSource::File(path) => {
                Ok(std::sync::Arc::new(super::file::FileCaptureDevice::new(
                    path,
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_constraints_default() {
        let constraints = CaptureConstraints::default();

        assert_eq!(constraints.sample_rate, 16000, "Default should be 16kHz");
        assert!(constraints.echo_cancellation, "Echo cancellation on by default");
        assert!(constraints.noise_suppression, "Noise suppression on by default");
    }

    #[test]
    fn test_capture_constraints_custom() {
        let constraints = CaptureConstraints {
            echo_cancellation: false,
            noise_suppression: false,
            sample_rate: 48000,
        };

        assert_eq!(constraints.sample_rate, 48000);
        assert!(!constraints.echo_cancellation);
    }

    #[test]
    fn test_factory_rejects_microphone_source() {
        let result = CaptureDeviceFactory::create(CaptureSource::Microphone);
        assert!(result.is_err(), "Microphone source has no backend in this build");
    }

    #[test]
    fn test_factory_builds_file_device() {
        let result = CaptureDeviceFactory::create(CaptureSource::File("clip.wav".into()));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().name(), "file");
    }
}
