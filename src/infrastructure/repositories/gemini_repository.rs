use super::tts_repository::{ProviderError, TranslationRepository, TtsRepository};
use crate::domain::tts::{LanguageCode, VoiceName};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TRANSLATION_MODEL: &str = "gemini-2.5-flash";

/// Gemini implementation of the speech and translation repositories
pub struct GeminiRepository {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    tts_model: String,
    translation_model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GeminiRepository {
    pub fn new(
        api_key: String,
        base_url: String,
        tts_model: String,
        translation_model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            tts_model,
            translation_model,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// POST a generateContent request and decode the response envelope
    async fn generate_content(
        &self,
        model: &str,
        body: serde_json::Value,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let response = self
            .http
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, model = model, "Gemini request failed to send");
                ProviderError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                model = model,
                message = %message,
                "Gemini returned an error status"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

fn first_parts(response: GenerateContentResponse) -> Vec<Part> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default()
}

#[async_trait]
impl TtsRepository for GeminiRepository {
    async fn synthesize_segment(
        &self,
        text: &str,
        voice: VoiceName,
    ) -> Result<Vec<u8>, ProviderError> {
        let start_time = std::time::Instant::now();

        tracing::debug!(
            model = %self.tts_model,
            voice = %voice,
            text_length = text.len(),
            text_preview = %text.chars().take(80).collect::<String>(),
            "Calling Gemini TTS"
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": voice.provider_id() }
                    }
                }
            }
        });

        let response = self.generate_content(&self.tts_model, body).await?;

        let encoded = first_parts(response)
            .into_iter()
            .find_map(|part| part.inline_data)
            .map(|inline| inline.data)
            .filter(|data| !data.is_empty())
            .ok_or(ProviderError::EmptyAudio)?;

        let audio_bytes = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::Malformed(format!("invalid base64 audio: {}", e)))?;

        tracing::debug!(
            provider = "gemini",
            voice = %voice,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio_bytes.len(),
            "Segment audio received"
        );

        Ok(audio_bytes)
    }
}

#[async_trait]
impl TranslationRepository for GeminiRepository {
    async fn translate(&self, text: &str, target: LanguageCode) -> Result<String, ProviderError> {
        tracing::info!(
            model = %self.translation_model,
            target = %target,
            text_length = text.len(),
            "Calling Gemini translation"
        );

        let prompt = format!(
            "Translate the following text to {}. Return ONLY the translation:\n\n{}",
            target.as_str(),
            text
        );
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self.generate_content(&self.translation_model, body).await?;

        let translated: String = first_parts(response)
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(translated.trim().to_string())
    }
}
