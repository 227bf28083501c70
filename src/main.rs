use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use lumina_tts::controllers::{health::HealthState, tts::TtsController};
use lumina_tts::domain::cache::AudioCache;
use lumina_tts::domain::tts::TtsService;
use lumina_tts::infrastructure::config::{Config, LogFormat};
use lumina_tts::infrastructure::db::{check_connection, create_pool, run_migrations, DbPool};
use lumina_tts::infrastructure::http::{build_router, start_http_server};
use lumina_tts::infrastructure::repositories::{
    CacheStore, GeminiRepository, MemoryCacheStore, PgCacheStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting Lumina TTS on {}:{}",
        config.host,
        config.port
    );

    // Cache store: Postgres when configured, memory otherwise
    let (pool, cache_store): (Option<Arc<DbPool>>, Arc<dyn CacheStore>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = create_pool(database_url, config.db_max_connections).await?;
                check_connection(&pool).await?;
                tracing::info!("Database connection verified");

                run_migrations(&pool).await?;
                tracing::info!("Database migrations applied");

                let pool = Arc::new(pool);
                let store: Arc<dyn CacheStore> = Arc::new(PgCacheStore::new(pool.clone()));
                (Some(pool), store)
            }
            None => {
                tracing::warn!(
                    capacity = config.memory_cache_capacity,
                    "DATABASE_URL not set, audio cache will not survive restarts"
                );
                let store: Arc<dyn CacheStore> =
                    Arc::new(MemoryCacheStore::new(config.memory_cache_capacity));
                (None, store)
            }
        };

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Provider client
    tracing::info!(
        tts_model = %config.tts_model,
        translation_model = %config.translation_model,
        "Instantiating Gemini client..."
    );
    let gemini = Arc::new(GeminiRepository::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
        config.tts_model.clone(),
        config.translation_model.clone(),
        config.request_timeout(),
    )?);

    // 2. Services
    tracing::info!("Instantiating services...");
    let cache = Arc::new(AudioCache::new(cache_store));
    let tts_service = Arc::new(TtsService::new(
        gemini.clone(),
        gemini,
        cache.clone(),
        config.pipeline_settings(),
        config.retry_policy(),
    ));

    // 3. Controllers
    tracing::info!("Instantiating controllers...");
    let tts_controller = Arc::new(TtsController::new(tts_service));
    let health_state = Arc::new(HealthState {
        pool,
        cache_backend: cache.backend(),
    });

    // Start HTTP server with all routes
    let app = build_router(health_state, tts_controller);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lumina_tts=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lumina_tts=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
