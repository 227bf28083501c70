use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::infrastructure::db::{check_connection, DbPool};

/// What the readiness probe needs to inspect
pub struct HealthState {
    /// Present only when the cache is backed by Postgres
    pub pool: Option<Arc<DbPool>>,
    pub cache_backend: &'static str,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = match &state.pool {
        None => "not_configured",
        Some(pool) => match check_connection(pool).await {
            Ok(_) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check could not reach the database");
                "disconnected"
            }
        },
    };

    if database == "disconnected" {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "database": database,
                "cache": state.cache_backend,
                "tts": "unknown"
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "database": database,
            "cache": state.cache_backend,
            "tts": "available"
        })),
    )
}
