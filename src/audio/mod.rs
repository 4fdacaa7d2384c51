pub mod convert;
pub mod decoder;
pub mod device;
pub mod file;
pub mod playback;
pub mod recorder;
pub mod wav;

pub use convert::{
    ConversionInput, ConversionStatus, Converter, ConverterHooks, NormalizedAudio,
    NORMALIZED_MIME_TYPE,
};
pub use decoder::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
pub use device::{
    AudioChunk, CaptureConstraints, CaptureDevice, CaptureDeviceFactory, CaptureSource,
    CaptureStream,
};
pub use file::FileCaptureDevice;
pub use playback::{BlobUrlRegistry, InMemoryUrlRegistry, PlaybackEntry, PlaybackHandle};
pub use recorder::{
    format_time, FinalizedAudio, Permission, Recorder, RecorderConfig, RecorderHooks,
    RecorderState, FALLBACK_MIME_TYPE, PREFERRED_MIME_TYPES,
};
pub use wav::{encode_pcm16_wav, pcm16_from_f32};
