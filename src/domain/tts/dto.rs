use serde::{Deserialize, Serialize};

use super::{LanguageCode, ProcessingState, SynthesisConfig, SynthesisResult, VoiceGender, VoiceName};
use crate::domain::audio::{ChunkTiming, PlaybackPosition};

/// Request for POST /api/tts/synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub voice: VoiceName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default)]
    pub language: LanguageCode,
}

impl TtsRequest {
    pub fn config(&self) -> SynthesisConfig {
        SynthesisConfig {
            voice: self.voice,
            speed: self.speed.unwrap_or(1.0),
            language: self.language,
        }
    }
}

/// Response for POST /api/tts/synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsResponse {
    pub audio_id: String,
    pub content_type: String,
    /// Base64 WAV
    pub audio: String,
    /// Text that was actually spoken, after translation
    pub text: String,
    pub chunks: Vec<String>,
    pub timings: Vec<ChunkTiming>,
    pub duration_secs: f64,
    pub from_cache: bool,
    pub progress: ProcessingState,
}

impl TtsResponse {
    pub fn new(result: SynthesisResult, text: String, progress: ProcessingState) -> Self {
        use base64::{engine::general_purpose, Engine as _};

        Self {
            audio: general_purpose::STANDARD.encode(&result.audio_data),
            audio_id: result.audio_id,
            content_type: "audio/wav".to_string(),
            text,
            chunks: result.chunks,
            timings: result.timings,
            duration_secs: result.duration_secs,
            from_cache: result.from_cache,
            progress,
        }
    }
}

/// Request for POST /api/translate
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub language: LanguageCode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub text: String,
    pub language: LanguageCode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: VoiceName,
    pub name: String,
    pub gender: VoiceGender,
}

impl From<VoiceName> for VoiceInfo {
    fn from(voice: VoiceName) -> Self {
        Self {
            id: voice,
            name: voice.provider_id(),
            gender: voice.gender(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: LanguageCode,
    pub label: String,
}

impl From<LanguageCode> for LanguageInfo {
    fn from(language: LanguageCode) -> Self {
        Self {
            code: language,
            label: language.label().to_string(),
        }
    }
}

/// Query for GET /api/tts/audio/:audio_id/position
#[derive(Debug, Deserialize)]
pub struct PositionQuery {
    pub t: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionResponse {
    pub chunk_index: usize,
    pub word_index: usize,
    pub chunk: String,
    pub word: Option<String>,
}

impl PositionResponse {
    pub fn new(position: PlaybackPosition, chunk: &str) -> Self {
        Self {
            chunk_index: position.chunk_index,
            word_index: position.word_index,
            chunk: chunk.to_string(),
            word: chunk
                .split_whitespace()
                .nth(position.word_index)
                .map(str::to_string),
        }
    }
}
