//! Record store — owner-scoped persistence for analysis records.
//!
//! Every lookup and delete filters on both `id` and `user_id`, so a record
//! owned by someone else is indistinguishable from one that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::UserId;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRecord, NewAnalysis};

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persists a new record; the store assigns a fresh id.
    async fn insert(&self, new: &NewAnalysis) -> Result<AnalysisRecord, AppError>;

    /// Most recent first. `None` returns every record the owner has.
    async fn find_by_owner(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<AnalysisRecord>, AppError>;

    async fn find_one(&self, id: Uuid, user_id: &UserId)
        -> Result<Option<AnalysisRecord>, AppError>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_one(&self, id: Uuid, user_id: &UserId) -> Result<u64, AppError>;

    /// Store reachability check for the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed store over the `skill_analyses` table.
#[derive(Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn insert(&self, new: &NewAnalysis) -> Result<AnalysisRecord, AppError> {
        let record = sqlx::query_as::<_, AnalysisRecord>(
            r#"
            INSERT INTO skill_analyses
                (user_id, resume_text, job_description, matched_skills, missing_skills,
                 extra_skills, match_percentage, roadmap, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(&new.user_id)
        .bind(&new.resume_text)
        .bind(&new.job_description)
        .bind(&new.matched_skills)
        .bind(&new.missing_skills)
        .bind(&new.extra_skills)
        .bind(new.match_percentage)
        .bind(&new.roadmap)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted skill analysis {} for user {}", record.id, record.user_id);
        Ok(record)
    }

    async fn find_by_owner(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<AnalysisRecord>, AppError> {
        // LIMIT NULL is LIMIT ALL in Postgres.
        Ok(sqlx::query_as::<_, AnalysisRecord>(
            r#"
            SELECT * FROM skill_analyses
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_one(
        &self,
        id: Uuid,
        user_id: &UserId,
    ) -> Result<Option<AnalysisRecord>, AppError> {
        Ok(sqlx::query_as::<_, AnalysisRecord>(
            "SELECT * FROM skill_analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_one(&self, id: Uuid, user_id: &UserId) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM skill_analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!("Deleted skill analysis {id} for user {user_id}");
        }
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
