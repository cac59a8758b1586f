//! Structural checks on inbound analysis payloads and history queries.

use serde::Deserialize;

use crate::config::HistoryLimits;
use crate::errors::AppError;

pub const MAX_TEXT_CHARS: usize = 100_000;

/// Body of `POST /skill-analysis`. `user_id` is optional; when present it must
/// match the authenticated caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnalysisRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub resume_text: String,
    pub job_description: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
    pub match_percentage: f64,
    #[serde(default)]
    pub roadmap: Option<String>,
}

/// Checks field-level rules, returning 422 on the first violation.
pub fn validate_create(req: &CreateAnalysisRequest) -> Result<(), AppError> {
    require_text("resume_text", &req.resume_text)?;
    require_text("job_description", &req.job_description)?;

    if !req.match_percentage.is_finite() || !(0.0..=100.0).contains(&req.match_percentage) {
        return Err(AppError::UnprocessableEntity(format!(
            "match_percentage must be between 0 and 100, got {}",
            req.match_percentage
        )));
    }

    if let Some(roadmap) = &req.roadmap {
        if roadmap.chars().count() > MAX_TEXT_CHARS {
            return Err(too_long("roadmap"));
        }
    }

    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "{field} must not be empty"
        )));
    }
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(too_long(field));
    }
    Ok(())
}

fn too_long(field: &str) -> AppError {
    AppError::UnprocessableEntity(format!(
        "{field} exceeds the maximum length of {MAX_TEXT_CHARS} characters"
    ))
}

/// Blank roadmaps are stored as absent.
pub fn normalize_roadmap(roadmap: Option<String>) -> Option<String> {
    roadmap.filter(|r| !r.trim().is_empty())
}

/// Resolves the raw `limit` query value into a concrete page size.
///
/// Absent → default; `all` → the configured maximum; numbers above the
/// maximum are clamped; zero or anything else unparsable is rejected.
pub fn resolve_history_limit(raw: Option<&str>, limits: HistoryLimits) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(limits.default_limit);
    };

    if raw.eq_ignore_ascii_case("all") {
        return Ok(limits.max_limit);
    }

    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(AppError::Validation(format!(
            "limit must be a positive integer or 'all', got '{raw}'"
        ))),
        Ok(n) => Ok(n.min(u64::from(limits.max_limit)) as u32),
    }
}
