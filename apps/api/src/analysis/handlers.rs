use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::service::not_found;
use crate::analysis::validation::{resolve_history_limit, CreateAnalysisRequest};
use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    /// A positive integer or `all`.
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct CreateAnalysisResponse {
    pub success: bool,
    pub id: String,
    /// Same value as `id`; the web client reads this name.
    pub analysis_id: String,
    pub analysis: AnalysisRecord,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub count: usize,
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: AnalysisRecord,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// POST /skill-analysis
pub async fn handle_create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<CreateAnalysisRequest>, JsonRejection>,
) -> Result<Json<CreateAnalysisResponse>, AppError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let analysis = state.service.create(&user, req).await?;
    Ok(Json(CreateAnalysisResponse {
        success: true,
        id: analysis.id.to_string(),
        analysis_id: analysis.id.to_string(),
        analysis,
        message: "Analysis saved successfully",
    }))
}

/// GET /skill-analysis/history
pub async fn handle_history(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let limit = resolve_history_limit(params.limit.as_deref(), state.config.history)?;
    let analyses = state.service.history(&user, limit).await?;
    Ok(Json(HistoryResponse {
        success: true,
        count: analyses.len(),
        analyses,
    }))
}

/// GET /skill-analysis/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = state.service.get(&user, parse_id(&id)?).await?;
    Ok(Json(AnalysisResponse {
        success: true,
        analysis,
    }))
}

/// DELETE /skill-analysis/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.service.delete(&user, parse_id(&id)?).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Analysis deleted successfully",
    }))
}

/// Ids are opaque to clients; one that cannot parse cannot exist.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
        AppError::UnprocessableEntity(rejection.body_text())
    } else {
        AppError::Validation(rejection.body_text())
    }
}
