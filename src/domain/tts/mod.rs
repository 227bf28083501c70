pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod language;
pub mod progress;
pub mod resilience;
pub mod segmenter;
pub mod service;
pub mod voice;

pub use error::{SynthesisError, TtsServiceError};
pub use language::LanguageCode;
pub use progress::{NoopProgress, ProcessingState, ProgressSink};
pub use resilience::RetryPolicy;
pub use service::{SynthesisResult, TtsService, TtsServiceApi};
pub use voice::{VoiceGender, VoiceName};

use crate::domain::audio::PROVIDER_SAMPLE_RATE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable per-request synthesis settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub voice: VoiceName,
    pub speed: f32,
    pub language: LanguageCode,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            voice: VoiceName::default(),
            speed: 1.0,
            language: LanguageCode::Original,
        }
    }
}

/// Tunables of the dispatch pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub chunk_max_words: usize,
    /// Worker count for the concurrent pass at the start of every run
    pub concurrency: usize,
    /// Pause after every provider call, successful or not
    pub inter_request_delay: Duration,
    pub silence_gap_secs: f64,
    pub sample_rate: u32,
    pub progress_tick: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            chunk_max_words: segmenter::DEFAULT_MAX_WORDS,
            concurrency: 2,
            inter_request_delay: Duration::from_millis(250),
            silence_gap_secs: 0.4,
            sample_rate: PROVIDER_SAMPLE_RATE,
            progress_tick: progress::TICK_INTERVAL,
        }
    }
}
