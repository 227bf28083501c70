use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{
        audio::locate,
        tts::{
            dto::{
                LanguageInfo, PositionQuery, PositionResponse, TranslateRequest,
                TranslateResponse, TtsRequest, TtsResponse, VoiceInfo,
            },
            LanguageCode, ProcessingState, SynthesisResult, TtsService, TtsServiceApi, VoiceName,
        },
    },
    error::{AppError, AppResult},
};

/// Largest accepted input, in characters
pub const MAX_TEXT_CHARS: usize = 100_000;

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

pub struct TtsController {
    tts_service: Arc<TtsService>,
}

fn validate_text(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".to_string()));
    }

    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::PayloadTooLarge(format!(
            "Text must be {} characters or less",
            MAX_TEXT_CHARS
        )));
    }

    Ok(())
}

fn wav_response(audio_data: Vec<u8>, extra: HeaderMap) -> (StatusCode, HeaderMap, Body) {
    let mut headers = extra;
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(audio_data.len()));
    (StatusCode::OK, headers, Body::from(audio_data))
}

impl TtsController {
    pub fn new(tts_service: Arc<TtsService>) -> Self {
        Self { tts_service }
    }

    /// POST /api/tts/synthesize - Convert text to speech
    ///
    /// The synthesis runs on its own task. If the client goes away the
    /// handler future is dropped, the drop guard fires and the run stops
    /// issuing provider calls.
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        Json(request): Json<TtsRequest>,
    ) -> AppResult<Json<TtsResponse>> {
        validate_text(&request.text)?;

        let config = request.config();
        if !(MIN_SPEED..=MAX_SPEED).contains(&config.speed) {
            return Err(AppError::BadRequest(format!(
                "Speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }

        let cancel = CancellationToken::new();
        let _abort_on_disconnect = cancel.clone().drop_guard();

        let text = if config.language.needs_translation() {
            controller
                .tts_service
                .translate(&request.text, config.language)
                .await?
        } else {
            request.text
        };

        let (progress_tx, progress_rx) = watch::channel(ProcessingState::default());
        spawn_progress_logger(progress_rx.clone());

        let service = controller.tts_service.clone();
        let task_text = text.clone();
        let task_cancel = cancel.clone();
        let result: SynthesisResult = tokio::spawn(async move {
            service
                .synthesize(&task_text, config, &progress_tx, &task_cancel)
                .await
        })
        .await
        .map_err(|e| AppError::Internal(format!("synthesis task failed: {}", e)))??;

        let progress = progress_rx.borrow().clone();
        Ok(Json(TtsResponse::new(result, text, progress)))
    }

    /// POST /api/translate - Translate text without synthesizing it
    pub async fn translate(
        State(controller): State<Arc<TtsController>>,
        Json(request): Json<TranslateRequest>,
    ) -> AppResult<Json<TranslateResponse>> {
        validate_text(&request.text)?;

        let text = controller
            .tts_service
            .translate(&request.text, request.language)
            .await?;

        Ok(Json(TranslateResponse {
            text,
            language: request.language,
        }))
    }

    /// GET /api/voices
    pub async fn list_voices() -> Json<Vec<VoiceInfo>> {
        Json(VoiceName::ALL.into_iter().map(VoiceInfo::from).collect())
    }

    /// GET /api/languages
    pub async fn list_languages() -> Json<Vec<LanguageInfo>> {
        Json(LanguageCode::ALL.into_iter().map(LanguageInfo::from).collect())
    }

    /// GET /api/voices/:voice/preview - Short WAV sample of one voice
    pub async fn preview_voice(
        State(controller): State<Arc<TtsController>>,
        Path(voice): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let voice: VoiceName = voice.parse().map_err(AppError::BadRequest)?;

        let cancel = CancellationToken::new();
        let _abort_on_disconnect = cancel.clone().drop_guard();

        let audio_data = controller.tts_service.preview_voice(voice, &cancel).await?;

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(voice.as_str()) {
            headers.insert("x-voice", value);
        }
        Ok(wav_response(audio_data, headers))
    }

    /// GET /api/tts/audio/:audio_id - Serve a previously synthesized WAV
    pub async fn get_audio(
        State(controller): State<Arc<TtsController>>,
        Path(audio_id): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let result = controller.tts_service.cached_audio(&audio_id).await?;

        let mut headers = HeaderMap::new();
        headers.insert("x-chunk-count", HeaderValue::from(result.chunks.len()));
        if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", result.duration_secs)) {
            headers.insert("x-duration-seconds", value);
        }
        Ok(wav_response(result.audio_data, headers))
    }

    /// GET /api/tts/audio/:audio_id/position?t=<secs> - Chunk and word being
    /// spoken at a playback time
    pub async fn get_position(
        State(controller): State<Arc<TtsController>>,
        Path(audio_id): Path<String>,
        Query(query): Query<PositionQuery>,
    ) -> AppResult<Json<PositionResponse>> {
        if !query.t.is_finite() || query.t < 0.0 {
            return Err(AppError::BadRequest("t must be a non-negative number".to_string()));
        }

        let result = controller.tts_service.cached_audio(&audio_id).await?;
        let position = locate(&result.timings, &result.chunks, query.t).ok_or_else(|| {
            AppError::NotFound(format!("nothing is spoken at {:.3}s", query.t))
        })?;

        Ok(Json(PositionResponse::new(
            position,
            &result.chunks[position.chunk_index],
        )))
    }

    /// DELETE /api/cache - Drop every cached artifact and chunk
    pub async fn clear_cache(
        State(controller): State<Arc<TtsController>>,
    ) -> AppResult<StatusCode> {
        controller.tts_service.clear_cache().await?;
        tracing::info!("Audio cache cleared");
        Ok(StatusCode::NO_CONTENT)
    }
}

fn spawn_progress_logger(mut progress_rx: watch::Receiver<ProcessingState>) {
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let state = progress_rx.borrow_and_update().clone();
            tracing::debug!(
                progress = state.progress,
                processed = state.processed_chunks,
                total = state.total_chunks,
                step = %state.current_step,
                "Synthesis progress"
            );
        }
    });
}
