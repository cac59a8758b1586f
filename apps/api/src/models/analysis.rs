use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted skill-comparison result, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: String,
    pub resume_text: String,
    pub job_description: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
    pub match_percentage: f64,
    pub roadmap: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated record ready for insertion. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub user_id: String,
    pub resume_text: String,
    pub job_description: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
    pub match_percentage: f64,
    pub roadmap: Option<String>,
    pub created_at: DateTime<Utc>,
}
