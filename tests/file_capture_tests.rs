// Integration tests for the file-backed capture device, driven through
// the recorder and on into the converter: the full capture -> finalize ->
// normalize pipeline without real hardware.

use scribeflow::audio::{
    ConversionInput, Converter, ConverterHooks, FileCaptureDevice, InMemoryUrlRegistry, Recorder,
    RecorderConfig, RecorderHooks, RecorderState, SymphoniaDecoder,
};
use scribeflow::AudioError;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Write a small WAV fixture to disk and return its path
fn write_wav_fixture(dir: &Path, name: &str, frames: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        writer.write_sample(((i % 200) as i16 - 100) * 50).unwrap();
    }
    writer.finalize().unwrap();

    path
}

fn file_recorder(path: &Path) -> Recorder {
    let device = FileCaptureDevice::new(path).with_chunk_bytes(1024);
    let config = RecorderConfig {
        chunk_interval: Duration::from_millis(2),
        ..RecorderConfig::default()
    };

    Recorder::new(
        config,
        RecorderHooks::default(),
        Arc::new(device),
        Arc::new(InMemoryUrlRegistry::new()),
    )
}

#[tokio::test]
async fn test_file_capture_finalizes_to_complete_source_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_wav_fixture(temp_dir.path(), "sample.wav", 8000);
    let expected = fs::read(&path).unwrap();

    let mut recorder = file_recorder(&path);

    recorder.start().await.unwrap();
    assert_eq!(recorder.state(), RecorderState::Recording);

    // Stop flushes the unread remainder, so the finalized bytes equal
    // the source file regardless of how many intervals elapsed
    recorder.stop().await.unwrap();

    let audio = recorder.finalized().expect("file capture should finalize");
    assert_eq!(audio.bytes, expected);
    assert_eq!(audio.mime_type, "audio/wav");
    assert!(audio.suggested_filename.ends_with(".wav"));
}

#[tokio::test]
async fn test_file_capture_feeds_converter() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_wav_fixture(temp_dir.path(), "memo.wav", 16000);

    let mut recorder = file_recorder(&path);
    recorder.start().await.unwrap();
    recorder.stop().await.unwrap();

    let input = ConversionInput::from(recorder.finalized().unwrap());
    let converter = Converter::new(Arc::new(SymphoniaDecoder), ConverterHooks::default());
    let normalized = converter.convert(input).await.unwrap();

    // 16000 mono frames at 16kHz: 1 second of PCM behind a 44-byte header
    assert_eq!(normalized.bytes.len(), 44 + 16000 * 2);
    assert_eq!(normalized.sample_rate, 16000);
    assert_eq!(normalized.channels, 1);
    assert_eq!(normalized.mime_type, "audio/wav");
    assert!(normalized.filename.ends_with(".wav"));

    let reader = hound::WavReader::new(Cursor::new(&normalized.bytes)).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
}

#[tokio::test]
async fn test_missing_file_is_a_device_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut recorder = file_recorder(&temp_dir.path().join("does-not-exist.wav"));

    let result = recorder.start().await;

    assert!(matches!(result, Err(AudioError::Device(_))));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert!(recorder.permission_warning());
}

#[tokio::test]
async fn test_externally_selected_file_bypasses_recorder() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_wav_fixture(temp_dir.path(), "upload.wav", 4000);

    // A user-selected file goes straight to the converter
    let input = ConversionInput::from_file(&path).await.unwrap();
    assert_eq!(input.filename, "upload.wav");

    let converter = Converter::new(Arc::new(SymphoniaDecoder), ConverterHooks::default());
    let normalized = converter.convert(input).await.unwrap();

    assert_eq!(normalized.bytes.len(), 44 + 4000 * 2);
    assert_eq!(normalized.filename, "upload.wav");
}

#[tokio::test]
async fn test_pause_suspends_file_chunk_delivery() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_wav_fixture(temp_dir.path(), "pausable.wav", 8000);

    let mut recorder = file_recorder(&path);
    recorder.start().await.unwrap();

    recorder.pause().await.unwrap();
    assert_eq!(recorder.state(), RecorderState::Paused);

    recorder.resume().await.unwrap();
    assert_eq!(recorder.state(), RecorderState::Recording);

    recorder.stop().await.unwrap();

    // Nothing is lost across the pause: the flush still completes the file
    let audio = recorder.finalized().unwrap();
    assert_eq!(audio.bytes, fs::read(&path).unwrap());
}
