use super::cache_store::{CacheStore, CacheStoreError};
use async_trait::async_trait;
use moka::future::Cache;

/// In-process cache store, used when no database is configured and in tests
pub struct MemoryCacheStore {
    cache: Cache<String, Vec<u8>>,
}

impl MemoryCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError> {
        self.cache.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheStoreError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
