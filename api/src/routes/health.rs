use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    database: &'static str,
}

// Liveness/readiness probe target; checks the database connection.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp: Utc::now().to_rfc3339(),
                database: "connected",
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp: Utc::now().to_rfc3339(),
                    database: "unavailable",
                }),
            )
        }
    }
}
