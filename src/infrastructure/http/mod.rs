pub mod request_id;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{
    health::{self, HealthState},
    tts::TtsController,
};
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router with every route and layer
pub fn build_router(health_state: Arc<HealthState>, tts_controller: Arc<TtsController>) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(health_state);

    let tts_routes = Router::new()
        .route("/api/tts/synthesize", post(TtsController::synthesize))
        .route("/api/tts/audio/:audio_id", get(TtsController::get_audio))
        .route(
            "/api/tts/audio/:audio_id/position",
            get(TtsController::get_position),
        )
        .route("/api/translate", post(TtsController::translate))
        .route("/api/voices", get(TtsController::list_voices))
        .route("/api/voices/:voice/preview", get(TtsController::preview_voice))
        .route("/api/languages", get(TtsController::list_languages))
        .route("/api/cache", delete(TtsController::clear_cache))
        .with_state(tts_controller);

    Router::new()
        .merge(health_routes)
        .merge(tts_routes)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server on the configured address
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
