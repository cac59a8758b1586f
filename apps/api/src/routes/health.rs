use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Skill Analysis API",
        "status": "running"
    }))
}

/// GET /health
/// Reports service version and whether the record store is reachable.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.service.store_healthy().await?;
    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "skill-analysis-api"
    })))
}
