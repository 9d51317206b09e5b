// handlers/mod.rs - Public operational endpoints plus the authenticated todo API
//
// Public (no auth): GET /, GET /health
// Protected (bearer token): /todos/*

pub mod todos;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Todo API",
        "version": version,
        "endpoints": {
            "health": "GET /health (public)",
            "list": "GET /todos",
            "create": "POST /todos",
            "get": "GET /todos/:todoId",
            "update": "PATCH /todos/:todoId",
            "delete": "DELETE /todos/:todoId",
            "attachment": "POST /todos/:todoId/attachment",
        }
    }))
}

/// GET /health - liveness plus item store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.todos.repository().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": "unavailable"
                })),
            )
        }
    }
}
