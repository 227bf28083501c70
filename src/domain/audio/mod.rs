//! Decoding provider PCM, stitching segments together and WAV encoding.

pub mod merge;
pub mod pcm;
pub mod timeline;
pub mod wav;

pub use merge::{merge, MergedAudio};
pub use pcm::{decode, SampleBuffer, PROVIDER_SAMPLE_RATE};
pub use timeline::{locate, ChunkTiming, PlaybackPosition};
pub use wav::encode_wav;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("no audio buffers to merge")]
    Empty,
    #[error("sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },
    #[error("WAV encoding failed: {0}")]
    Encode(String),
}
