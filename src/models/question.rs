// src/models/question.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;
use validator::Validate;

/// Represents the 'quiz_questions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,

    /// Section this question is delivered under. Bank questions may not be
    /// attached to a section until assembly.
    pub section_id: Option<Uuid>,

    /// Skill this question tests.
    pub skill_id: Option<Uuid>,

    pub stem: String,

    /// Choice key -> choice text (e.g., {"a": "...", "b": "..."}).
    /// Stored as JSONB.
    pub choices: Json<BTreeMap<String, String>>,

    /// Key into `choices` identifying the correct answer.
    pub answer_key: String,

    /// 'beginner', 'intermediate' or 'expert'.
    pub difficulty: String,

    /// Scoring weight on a 1.0-5.0 scale; scoring applies a neutral 3.0
    /// when absent.
    pub importance: Option<f64>,

    /// Whether the question belongs to the reusable bank.
    pub is_bank_question: bool,

    pub times_used: i32,
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for delivering a question to a candidate (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub skill_id: Option<Uuid>,
    pub skill_name: String,
    pub stem: String,
    pub choices: Json<BTreeMap<String, String>>,
    pub difficulty: String,
}

impl PublicQuestion {
    pub fn from_question(question: QuizQuestion, skill_name: &str) -> Self {
        Self {
            id: question.id,
            skill_id: question.skill_id,
            skill_name: skill_name.to_string(),
            stem: question.stem,
            choices: question.choices,
            difficulty: question.difficulty,
        }
    }
}

/// DTO for inserting a question into the bank. This is the boundary where
/// externally produced records (generation scripts, admin tooling) are
/// validated before entering the system.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub skill_id: Uuid,
    pub section_id: Option<Uuid>,
    #[validate(length(min = 1, max = 1000))]
    pub stem: String,
    #[validate(custom(function = validate_choices))]
    pub choices: BTreeMap<String, String>,
    #[validate(length(min = 1, max = 10))]
    pub answer_key: String,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
    #[validate(range(min = 1.0, max = 5.0))]
    pub importance: Option<f64>,
    pub is_bank_question: Option<bool>,
}

fn validate_choices(choices: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    if choices.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_choices"));
    }
    for (key, text) in choices {
        if key.is_empty() || key.len() > 10 {
            return Err(validator::ValidationError::new("bad_choice_key"));
        }
        if text.is_empty() || text.len() > 500 {
            return Err(validator::ValidationError::new("bad_choice_text"));
        }
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    match difficulty {
        "beginner" | "intermediate" | "expert" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_difficulty")),
    }
}
