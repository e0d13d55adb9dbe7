// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'quizzes' table. One quiz per job.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub job_id: Uuid,
    pub soc_code: String,
    pub company_id: Option<Uuid>,
    pub required_proficiency_pct: Option<f64>,
}

/// Represents the 'quiz_sections' table. One section per tested skill;
/// `skill_id` is null only for legacy ungrouped sections, which are still
/// scored but cannot be named in summaries.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSection {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub skill_id: Option<Uuid>,
    pub position: i32,
}
