// src/models/assessment.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'assessments' table: one user's attempt at one job's quiz.
/// Readiness fields stay null until analysis runs; re-analysis overwrites
/// them in place.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_id: Uuid,
    pub readiness_pct: Option<f64>,
    pub status_tag: Option<String>,
    pub analyzed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'quiz_responses' table: one answer event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResponse {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub question_id: Uuid,
    pub selected: String,
    pub is_correct: bool,
}

/// Represents the 'assessment_skill_results' table. Unique on
/// (assessment_id, skill_id); upserted on re-analysis, never duplicated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssessmentSkillResult {
    pub assessment_id: Uuid,
    pub skill_id: Uuid,
    pub score_pct: f64,
    pub band: String,
}

/// DTO for requesting analysis of a finished assessment.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub assessment_id: Uuid,
}

/// DTO for requesting a newly assembled assessment for a user and job.
#[derive(Debug, Deserialize)]
pub struct AssembleRequest {
    pub job_id: Uuid,
    pub user_id: Uuid,
}
