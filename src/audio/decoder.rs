// Audio decode capability
//
// The converter decodes arbitrary browser-supported encodings through this
// trait; `SymphoniaDecoder` is the production implementation. All decode
// state is scoped to a single call, so the transient decoding context is
// released exactly once whether the call succeeds or fails.

use crate::error::AudioError;
use std::io::Cursor;
use tracing::{debug, info, warn};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio samples
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Raw samples in [-1, 1] (interleaved if multi-channel)
    pub samples: Vec<f32>,
    /// Sample rate of the decoded audio
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl DecodedAudio {
    /// Duration in seconds, derived from frame count
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        frames as f64 / self.sample_rate as f64
    }
}

/// Decode capability consumed by the converter
pub trait AudioDecoder: Send + Sync {
    /// Decode encoded audio bytes into interleaved f32 samples.
    ///
    /// `extension_hint` is the input filename's extension, used to steer
    /// container probing; it may be absent or wrong.
    fn decode(
        &self,
        bytes: &[u8],
        extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError>;
}

/// Symphonia-backed decoder for the formats the pipeline accepts
/// (WAV, MP3, M4A, FLAC, OGG)
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(
        &self,
        bytes: &[u8],
        extension_hint: Option<&str>,
    ) -> Result<DecodedAudio, AudioError> {
        let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension_hint {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::Decode(format!("failed to probe audio format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::Decode("no audio track found in input".into()))?;

        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| AudioError::Decode("unknown sample rate".into()))?;

        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);

        debug!(
            "Decoding audio track: {}Hz, {} channels (from metadata)",
            sample_rate, channels
        );

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::Decode(format!("failed to create decoder: {}", e)))?;

        let mut all_samples: Vec<f32> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_buf.is_none() {
                        let spec = *decoded.spec();
                        let duration = decoded.capacity() as u64;
                        // Metadata may be wrong or missing; trust the
                        // first decoded buffer's channel count.
                        let actual_channels = spec.channels.count() as u16;
                        if actual_channels != channels {
                            info!(
                                "Channel count corrected: metadata={} actual={}",
                                channels, actual_channels
                            );
                            channels = actual_channels;
                        }
                        sample_buf = Some(SampleBuffer::<f32>::new(duration, spec));
                    }

                    if let Some(buf) = &mut sample_buf {
                        buf.copy_interleaved_ref(decoded);
                        all_samples.extend_from_slice(buf.samples());
                    }
                }
                Err(e) => {
                    warn!("Error decoding packet: {}", e);
                    continue;
                }
            }
        }

        if all_samples.is_empty() {
            return Err(AudioError::Decode("no audio samples decoded from input".into()));
        }

        let decoded = DecodedAudio {
            samples: all_samples,
            sample_rate,
            channels,
        };

        info!(
            "Decoded {} samples ({:.2}s) at {}Hz, {} channels",
            decoded.samples.len(),
            decoded.duration_seconds(),
            decoded.sample_rate,
            decoded.channels
        );

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_mono() {
        let audio = DecodedAudio {
            samples: vec![0.0; 16000],
            sample_rate: 16000,
            channels: 1,
        };

        assert!((audio.duration_seconds() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_duration_stereo_counts_frames() {
        let audio = DecodedAudio {
            samples: vec![0.0; 96000], // 1 second at 48kHz stereo
            sample_rate: 48000,
            channels: 2,
        };

        assert!((audio.duration_seconds() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = SymphoniaDecoder.decode(&[0u8; 32], Some("wav"));
        assert!(result.is_err());
    }
}
