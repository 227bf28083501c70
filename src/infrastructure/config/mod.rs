use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::domain::tts::{PipelineSettings, RetryPolicy};
use crate::infrastructure::repositories::gemini_repository::{
    DEFAULT_BASE_URL, DEFAULT_TRANSLATION_MODEL, DEFAULT_TTS_MODEL,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Cache store falls back to memory when unset
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Gemini
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub tts_model: String,
    pub translation_model: String,
    // Pipeline
    pub chunk_max_words: usize,
    pub tts_concurrency: usize,
    pub tts_max_attempts: u32,
    pub tts_request_timeout_secs: u64,
    pub tts_inter_request_delay_ms: u64,
    pub tts_silence_gap_secs: f64,
    pub tts_sample_rate: u32,
    pub memory_cache_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "8080").parse()?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: var_or("DB_MAX_CONNECTIONS", "5").parse()?,
            environment: match var_or("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var_or("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            gemini_api_key: env::var("GEMINI_API_KEY")
                .map_err(|_| "GEMINI_API_KEY must be set")?,
            gemini_base_url: var_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            tts_model: var_or("TTS_MODEL", DEFAULT_TTS_MODEL),
            translation_model: var_or("TRANSLATION_MODEL", DEFAULT_TRANSLATION_MODEL),
            chunk_max_words: var_or("CHUNK_MAX_WORDS", "200").parse()?,
            tts_concurrency: var_or("TTS_CONCURRENCY", "2").parse()?,
            tts_max_attempts: var_or("TTS_MAX_ATTEMPTS", "4").parse()?,
            tts_request_timeout_secs: var_or("TTS_REQUEST_TIMEOUT_SECS", "45").parse()?,
            tts_inter_request_delay_ms: var_or("TTS_INTER_REQUEST_DELAY_MS", "250").parse()?,
            tts_silence_gap_secs: var_or("TTS_SILENCE_GAP_SECS", "0.4").parse()?,
            tts_sample_rate: var_or("TTS_SAMPLE_RATE", "24000").parse()?,
            memory_cache_capacity: var_or("MEMORY_CACHE_CAPACITY", "512").parse()?,
        };

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.tts_request_timeout_secs)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            chunk_max_words: self.chunk_max_words.max(1),
            concurrency: self.tts_concurrency.max(1),
            inter_request_delay: Duration::from_millis(self.tts_inter_request_delay_ms),
            silence_gap_secs: self.tts_silence_gap_secs.max(0.0),
            sample_rate: self.tts_sample_rate,
            ..PipelineSettings::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.tts_max_attempts.max(1),
            timeout: self.request_timeout(),
            ..RetryPolicy::default()
        }
    }
}
