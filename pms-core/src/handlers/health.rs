use axum::{extract::State, http::StatusCode, response::Json};

use super::AppState;
use crate::store::DocumentStore;

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pms-core",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Store health check endpoint.
///
/// Verifies that the document store answers a trivial request.
pub async fn store_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state.workspace.store().ping().await.map_err(|e| {
        tracing::error!("Store health check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "store": "connected"
    })))
}
