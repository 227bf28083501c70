use super::dispatcher::Dispatcher;
use super::error::{SynthesisError, TtsServiceError};
use super::progress::{ProgressSink, ProgressTracker};
use super::resilience::{with_retry, RetryPolicy};
use super::segmenter::{normalize_text, segment};
use super::{LanguageCode, PipelineSettings, SynthesisConfig, VoiceName};
use crate::domain::audio::{decode, merge, ChunkTiming};
use crate::domain::cache::{request_fingerprint, AudioCache, CachedSynthesis};
use crate::infrastructure::repositories::{TranslationRepository, TtsRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Phrase spoken by voice previews
const PREVIEW_PHRASE: &str = "Hello! This is how I sound.";

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Handle of the artifact in the request cache
    pub audio_id: String,
    /// WAV file bytes
    pub audio_data: Vec<u8>,
    /// Chunk texts as actually synthesized, parallel to `timings`
    pub chunks: Vec<String>,
    pub timings: Vec<ChunkTiming>,
    pub duration_secs: f64,
    pub from_cache: bool,
}

impl SynthesisResult {
    fn from_cached(audio_id: String, entry: CachedSynthesis) -> Self {
        let duration_secs = entry.timings.last().map(|t| t.end).unwrap_or(0.0);
        Self {
            audio_id,
            audio_data: entry.audio_bytes,
            chunks: entry.chunk_texts,
            timings: entry.timings,
            duration_secs,
            from_cache: true,
        }
    }
}

pub struct TtsService {
    tts_repo: Arc<dyn TtsRepository>,
    translation_repo: Arc<dyn TranslationRepository>,
    cache: Arc<AudioCache>,
    settings: PipelineSettings,
    retry_policy: RetryPolicy,
}

impl TtsService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        translation_repo: Arc<dyn TranslationRepository>,
        cache: Arc<AudioCache>,
        settings: PipelineSettings,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            tts_repo,
            translation_repo,
            cache,
            settings,
            retry_policy,
        }
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Synthesize text into one WAV artifact with per-chunk timings
    ///
    /// This operation:
    /// - Returns the whole-request cache entry when there is one
    /// - Splits the text into chunks and runs the dispatch passes
    /// - Merges the chunk audio and caches the result
    ///
    /// A run either fully succeeds or fully fails; nothing partial is cached.
    async fn synthesize(
        &self,
        text: &str,
        config: SynthesisConfig,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<SynthesisResult, TtsServiceError>;

    /// Translate text for synthesis. `Original` returns the text unchanged.
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<String, TtsServiceError>;

    /// Short WAV sample of a voice
    async fn preview_voice(
        &self,
        voice: VoiceName,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TtsServiceError>;

    /// Look up a previously produced artifact by its handle
    async fn cached_audio(&self, audio_id: &str) -> Result<SynthesisResult, TtsServiceError>;

    async fn clear_cache(&self) -> Result<(), TtsServiceError>;
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(
        &self,
        text: &str,
        config: SynthesisConfig,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<SynthesisResult, TtsServiceError> {
        let start_time = std::time::Instant::now();

        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(TtsServiceError::NoContent("No text found to process".to_string()));
        }

        // 1. Whole-request cache
        let audio_id = request_fingerprint(&normalized, &config);
        if let Some(entry) = self.cache.lookup_request(&audio_id).await {
            let total = entry.chunk_texts.len();
            tracing::info!(
                audio_id = %audio_id,
                chunk_count = total,
                audio_size = entry.audio_bytes.len(),
                "TTS cache hit - returning cached audio"
            );
            let tracker = ProgressTracker::new(progress, total);
            tracker.finish("Retrieved from cache");
            return Ok(SynthesisResult::from_cached(audio_id, entry));
        }

        // 2. Segmentation
        let chunks = segment(&normalized, self.settings.chunk_max_words);
        let total = chunks.len();
        tracing::info!(
            audio_id = %audio_id,
            voice = %config.voice,
            speed = config.speed,
            language = %config.language,
            text_length = normalized.len(),
            chunk_count = total,
            "Text split into chunks"
        );

        let tracker = ProgressTracker::new(progress, total);
        tracker.start();

        // 3. Passes 1-4, with the progress ticker running alongside
        let dispatcher = Dispatcher::new(
            self.tts_repo.as_ref(),
            self.cache.as_ref(),
            &self.settings,
            &self.retry_policy,
            &tracker,
            cancel,
            config.voice,
            chunks,
        );

        let outcome = tokio::select! {
            result = dispatcher.run() => result,
            _ = tracker.run_ticker(self.settings.progress_tick) => {
                Err(TtsServiceError::Other(anyhow::anyhow!("progress ticker stopped")))
            }
        };

        let slots = match outcome {
            Ok(slots) => slots,
            Err(TtsServiceError::Aborted) => {
                tracing::info!(audio_id = %audio_id, "Synthesis aborted by caller");
                tracker.fail("Synthesis cancelled");
                return Err(TtsServiceError::Aborted);
            }
            Err(e) => {
                tracing::error!(audio_id = %audio_id, error = %e, "Synthesis failed");
                tracker.fail(&e.to_string());
                return Err(e);
            }
        };

        // 4. Assemble
        tracker.assembling();
        let (chunk_texts, buffers): (Vec<String>, Vec<_>) = slots
            .into_iter()
            .filter_map(|slot| slot.buffer.map(|buffer| (slot.text, buffer)))
            .unzip();

        let merged = merge(&buffers, self.settings.silence_gap_secs)
            .map_err(|e| TtsServiceError::Other(anyhow::anyhow!(e)))?;

        let entry = CachedSynthesis {
            audio_bytes: merged.wav,
            chunk_texts,
            timings: merged.timings,
            created_at: Utc::now(),
        };
        self.cache.store_request(&audio_id, &entry).await;

        tracker.finish("Success!");

        let duration = start_time.elapsed();
        tracing::info!(
            provider = "gemini",
            audio_id = %audio_id,
            latency_ms = duration.as_millis(),
            chunk_count = entry.chunk_texts.len(),
            audio_size_bytes = entry.audio_bytes.len(),
            audio_secs = format!("{:.2}", merged.total_samples as f64 / merged.sample_rate as f64),
            "TTS synthesis completed"
        );

        let mut result = SynthesisResult::from_cached(audio_id, entry);
        result.from_cache = false;
        Ok(result)
    }

    async fn translate(&self, text: &str, target: LanguageCode) -> Result<String, TtsServiceError> {
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(TtsServiceError::Invalid("Text cannot be empty".to_string()));
        }
        if !target.needs_translation() {
            return Ok(normalized.to_string());
        }

        let translated = self
            .translation_repo
            .translate(normalized, target)
            .await
            .map_err(|e| TtsServiceError::from(SynthesisError::from(e)))?;

        if translated.is_empty() {
            return Err(TtsServiceError::NoContent(
                "Translation returned no text".to_string(),
            ));
        }

        tracing::info!(
            target = %target,
            source_length = normalized.len(),
            translated_length = translated.len(),
            "Text translated"
        );

        Ok(translated)
    }

    async fn preview_voice(
        &self,
        voice: VoiceName,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TtsServiceError> {
        let repo = self.tts_repo.as_ref();

        let bytes = with_retry(
            &self.retry_policy,
            cancel,
            || {},
            move || async move {
                repo.synthesize_segment(PREVIEW_PHRASE, voice)
                    .await
                    .map_err(SynthesisError::from)
            },
        )
        .await?;

        let buffer = decode(&bytes, self.settings.sample_rate);
        let merged = merge(&[buffer], 0.0).map_err(|e| TtsServiceError::Other(anyhow::anyhow!(e)))?;

        tracing::info!(voice = %voice, audio_size = merged.wav.len(), "Voice preview generated");

        Ok(merged.wav)
    }

    async fn cached_audio(&self, audio_id: &str) -> Result<SynthesisResult, TtsServiceError> {
        self.cache
            .lookup_request(audio_id)
            .await
            .map(|entry| SynthesisResult::from_cached(audio_id.to_string(), entry))
            .ok_or_else(|| TtsServiceError::NotFound(format!("audio {}", audio_id)))
    }

    async fn clear_cache(&self) -> Result<(), TtsServiceError> {
        self.cache
            .clear_all()
            .await
            .map_err(|e| TtsServiceError::Dependency(e.to_string()))
    }
}
