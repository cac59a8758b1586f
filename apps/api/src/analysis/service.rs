use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::analysis::store::AnalysisStore;
use crate::analysis::validation::{normalize_roadmap, validate_create, CreateAnalysisRequest};
use crate::auth::UserId;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRecord, NewAnalysis};

/// Owner-scoped operations over analysis records. Every method takes the
/// already-verified caller; nothing here trusts identity from the payload.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn AnalysisStore>,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        owner: &UserId,
        req: CreateAnalysisRequest,
    ) -> Result<AnalysisRecord, AppError> {
        if let Some(claimed) = req.user_id.as_deref() {
            if claimed != owner.as_str() {
                warn!("User {owner} attempted to create an analysis for another user");
                return Err(AppError::Forbidden(
                    "user_id does not match the authenticated user".to_string(),
                ));
            }
        }

        validate_create(&req)?;

        let new = NewAnalysis {
            user_id: owner.as_str().to_string(),
            resume_text: req.resume_text,
            job_description: req.job_description,
            matched_skills: req.matched_skills,
            missing_skills: req.missing_skills,
            extra_skills: req.extra_skills,
            match_percentage: req.match_percentage,
            roadmap: normalize_roadmap(req.roadmap),
            created_at: Utc::now(),
        };

        self.store.insert(&new).await
    }

    /// `limit` must already be resolved against the configured bounds.
    pub async fn history(
        &self,
        owner: &UserId,
        limit: u32,
    ) -> Result<Vec<AnalysisRecord>, AppError> {
        self.store.find_by_owner(owner, Some(limit)).await
    }

    pub async fn get(&self, owner: &UserId, id: Uuid) -> Result<AnalysisRecord, AppError> {
        self.store
            .find_one(id, owner)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, owner: &UserId, id: Uuid) -> Result<(), AppError> {
        match self.store.delete_one(id, owner).await? {
            0 => Err(not_found()),
            _ => Ok(()),
        }
    }

    pub async fn store_healthy(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}

/// Same outcome whether the record is absent or owned by someone else.
pub fn not_found() -> AppError {
    AppError::NotFound("Analysis not found".to_string())
}
