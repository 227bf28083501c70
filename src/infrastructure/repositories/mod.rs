pub mod cache_store;
pub mod gemini_repository;
pub mod memory_cache_store;
pub mod pg_cache_store;
pub mod tts_repository;

pub use cache_store::{CacheStore, CacheStoreError};
pub use gemini_repository::GeminiRepository;
pub use memory_cache_store::MemoryCacheStore;
pub use pg_cache_store::PgCacheStore;
pub use tts_repository::{ProviderError, TranslationRepository, TtsRepository};
