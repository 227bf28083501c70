use super::cache_store::{CacheStore, CacheStoreError};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Postgres-backed cache store (`audio_cache` table)
pub struct PgCacheStore {
    pool: Arc<DbPool>,
}

impl PgCacheStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let pool = self.pool.as_ref();

        let payload = sqlx::query_scalar::<_, Vec<u8>>(
            r#"
            SELECT payload
            FROM audio_cache
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(payload)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), CacheStoreError> {
        let pool = self.pool.as_ref();

        // Entries are immutable once written; a concurrent duplicate write keeps the first
        sqlx::query(
            r#"
            INSERT INTO audio_cache (key, payload, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheStoreError> {
        sqlx::query("DELETE FROM audio_cache")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
