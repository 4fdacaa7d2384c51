//! Transcription API collaborator
//!
//! The upload client is the only consumer of the recorder/converter
//! outputs. This module covers its interface boundary:
//! - POST /transcriptions - multipart upload of normalized audio + settings
//! - GET /transcriptions - list completed and in-flight transcriptions
//! - DELETE /transcriptions/:id - remove a transcription

mod client;
mod records;

pub use client::TranscriptionClient;
pub use records::{TranscriptionRecord, TranscriptionStatus, UploadSettings};
