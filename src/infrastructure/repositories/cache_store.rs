use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistent key/value store for binary blobs.
///
/// Callers treat every failure as best-effort: a failed read is a miss and a
/// failed write is skipped.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError>;

    /// Remove every entry in the store
    async fn clear(&self) -> Result<(), CacheStoreError>;

    /// Short name reported by health checks
    fn backend(&self) -> &'static str;
}
