pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod transcription;

pub use audio::{
    format_time, AudioChunk, AudioDecoder, BlobUrlRegistry, CaptureConstraints, CaptureDevice,
    CaptureDeviceFactory, CaptureSource, CaptureStream, ConversionInput, ConversionStatus,
    Converter, ConverterHooks, DecodedAudio, FileCaptureDevice, FinalizedAudio,
    InMemoryUrlRegistry, NormalizedAudio, Permission, PlaybackHandle, Recorder, RecorderConfig,
    RecorderHooks, RecorderState, SymphoniaDecoder,
};
pub use config::Config;
pub use error::AudioError;
pub use http::{create_router, AppState};
pub use transcription::{TranscriptionClient, TranscriptionRecord, UploadSettings};
