//! HTTP handlers. Each one is a thin shim: extract, validate, call the
//! service, shape the status code. Domain rules live in `crate::services`.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod upload;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// Liveness plus a database round-trip. Reports degraded (503) when the
/// pool cannot reach Postgres so load balancers stop routing here.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(err) => {
            tracing::warn!(error = %err, "health check database probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}
