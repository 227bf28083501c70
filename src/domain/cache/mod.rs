//! Content-addressable audio cache with two key spaces (whole request and
//! single chunk) sharing one persistent store.

pub mod fingerprint;

pub use fingerprint::{chunk_fingerprint, request_fingerprint};

use crate::domain::audio::ChunkTiming;
use crate::infrastructure::repositories::{CacheStore, CacheStoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const REQUEST_NAMESPACE: &str = "request";
const CHUNK_NAMESPACE: &str = "chunk";

/// Cached result of a complete synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSynthesis {
    #[serde(with = "base64_bytes")]
    pub audio_bytes: Vec<u8>,
    pub chunk_texts: Vec<String>,
    pub timings: Vec<ChunkTiming>,
    pub created_at: DateTime<Utc>,
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Best-effort cache over a [`CacheStore`]. Reads that fail are misses and
/// writes that fail are logged and skipped.
pub struct AudioCache {
    store: Arc<dyn CacheStore>,
}

impl AudioCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    fn key(namespace: &str, fingerprint: &str) -> String {
        format!("{}/{}", namespace, fingerprint)
    }

    async fn read(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: Vec<u8>) {
        if let Err(e) = self.store.put(key, value).await {
            tracing::warn!(error = %e, key = %key, "Cache write failed, skipping");
        }
    }

    pub async fn lookup_request(&self, fingerprint: &str) -> Option<CachedSynthesis> {
        let raw = self.read(&Self::key(REQUEST_NAMESPACE, fingerprint)).await?;
        match serde_json::from_slice::<CachedSynthesis>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, fingerprint = %fingerprint, "Corrupt request cache entry, treating as miss");
                None
            }
        }
    }

    pub async fn store_request(&self, fingerprint: &str, entry: &CachedSynthesis) {
        match serde_json::to_vec(entry) {
            Ok(raw) => self.write(&Self::key(REQUEST_NAMESPACE, fingerprint), raw).await,
            Err(e) => tracing::warn!(error = %e, "Failed to serialize request cache entry"),
        }
    }

    pub async fn lookup_chunk(&self, fingerprint: &str) -> Option<Vec<u8>> {
        self.read(&Self::key(CHUNK_NAMESPACE, fingerprint)).await
    }

    pub async fn store_chunk(&self, fingerprint: &str, provider_bytes: &[u8]) {
        self.write(&Self::key(CHUNK_NAMESPACE, fingerprint), provider_bytes.to_vec())
            .await
    }

    /// Drop both key spaces. Unlike reads and writes, a failure here is
    /// reported to the caller since the user asked for it explicitly.
    pub async fn clear_all(&self) -> Result<(), CacheStoreError> {
        self.store.clear().await?;
        tracing::info!(backend = self.store.backend(), "Audio cache cleared");
        Ok(())
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}
