use crate::domain::tts::{LanguageCode, VoiceName};
use async_trait::async_trait;

/// Raw failure of a provider call. Carries the HTTP status when there is one
/// so the resilience layer can classify it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider response contained no audio")]
    EmptyAudio,
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Repository for per-segment speech synthesis.
/// Abstracts the underlying TTS provider.
///
/// Implementations perform exactly one provider request per call. They do not
/// retry, split or cache; the pipeline owns all of that.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one segment of text with a prebuilt voice
    ///
    /// Returns raw 16-bit signed little-endian mono PCM at the provider's
    /// fixed sample rate.
    async fn synthesize_segment(
        &self,
        text: &str,
        voice: VoiceName,
    ) -> Result<Vec<u8>, ProviderError>;
}

/// Repository for single-shot text translation
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<String, ProviderError>;
}
