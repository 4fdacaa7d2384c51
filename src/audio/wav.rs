// Canonical upload encoding: 16-bit signed little-endian PCM in a WAV
// container, sample rate and channel layout preserved from the input.

use crate::error::AudioError;
use std::io::Cursor;

use super::decoder::DecodedAudio;

/// Convert one float sample to a 16-bit PCM sample.
///
/// The input is clamped to [-1, 1], then scaled asymmetrically: negative
/// values by 2^15, non-negative by 2^15 - 1, so -1.0 and +1.0 both land
/// exactly on the i16 bounds without overflow.
pub fn pcm16_from_f32(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    scaled.round() as i16
}

/// Encode decoded samples as an in-memory PCM16 WAV file.
///
/// The output carries the standard 44-byte header declaring the input's
/// sample rate and channel count; interleaved channel order is preserved.
pub fn encode_pcm16_wav(audio: &DecodedAudio) -> Result<Vec<u8>, AudioError> {
    if audio.channels == 0 || audio.sample_rate == 0 {
        return Err(AudioError::Encode(format!(
            "invalid output format: {}Hz, {} channels",
            audio.sample_rate, audio.channels
        )));
    }

    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| AudioError::Encode(format!("failed to create WAV writer: {}", e)))?;

        for &sample in &audio.samples {
            writer
                .write_sample(pcm16_from_f32(sample))
                .map_err(|e| AudioError::Encode(format!("failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| AudioError::Encode(format!("failed to finalize WAV: {}", e)))?;
    }

    Ok(cursor.into_inner())
}
