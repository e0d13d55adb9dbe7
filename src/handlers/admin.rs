// src/handlers/admin.rs

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, models::question::CreateQuestionRequest};

/// Inserts a validated question into the bank.
///
/// This is the boundary where externally generated records (LLM output,
/// seed tooling) enter the system; malformed records are rejected here,
/// never stored.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // The answer key must point at one of the choices.
    if !payload.choices.contains_key(&payload.answer_key) {
        return Err(AppError::BadRequest(format!(
            "Answer key '{}' is not among the choices",
            payload.answer_key
        )));
    }

    // Skill must exist; a bank question without a real skill can never be
    // sampled.
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM skills WHERE id = $1")
        .bind(payload.skill_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Skill not found".to_string()))?;

    let choices_json = serde_json::to_value(&payload.choices).unwrap_or_default();

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO quiz_questions
        (skill_id, section_id, stem, choices, answer_key, difficulty, importance, is_bank_question, times_used)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
        RETURNING id
        "#,
    )
    .bind(payload.skill_id)
    .bind(payload.section_id)
    .bind(&payload.stem)
    .bind(choices_json)
    .bind(&payload.answer_key)
    .bind(&payload.difficulty)
    .bind(payload.importance)
    .bind(payload.is_bank_question.unwrap_or(true))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating a bank question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub stem: Option<String>,
    pub choices: Option<BTreeMap<String, String>>,
    pub answer_key: Option<String>,
    pub difficulty: Option<String>,
    pub importance: Option<f64>,
    pub is_bank_question: Option<bool>,
}

/// Helper struct for the stored key/choices pair a patch merges against.
#[derive(sqlx::FromRow)]
struct AnswerKeyRow {
    answer_key: String,
    choices: sqlx::types::Json<BTreeMap<String, String>>,
}

/// Updates a question by ID. The merged record must keep its answer key
/// among its choices, same as on create.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.stem.is_none()
        && payload.choices.is_none()
        && payload.answer_key.is_none()
        && payload.difficulty.is_none()
        && payload.importance.is_none()
        && payload.is_bank_question.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(difficulty) = payload.difficulty.as_deref() {
        if !matches!(difficulty, "beginner" | "intermediate" | "expert") {
            return Err(AppError::BadRequest(format!(
                "Unknown difficulty '{}'",
                difficulty
            )));
        }
    }

    if let Some(importance) = payload.importance {
        if !(1.0..=5.0).contains(&importance) {
            return Err(AppError::BadRequest(
                "Importance must be between 1.0 and 5.0".to_string(),
            ));
        }
    }

    if payload.answer_key.is_some() || payload.choices.is_some() {
        let current = sqlx::query_as::<_, AnswerKeyRow>(
            "SELECT answer_key, choices FROM quiz_questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

        let merged_key = payload.answer_key.as_deref().unwrap_or(&current.answer_key);
        let merged_choices = payload.choices.as_ref().unwrap_or(&current.choices.0);
        if !merged_choices.contains_key(merged_key) {
            return Err(AppError::BadRequest(format!(
                "Answer key '{}' is not among the choices",
                merged_key
            )));
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quiz_questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(stem) = payload.stem {
        separated.push("stem = ");
        separated.push_bind_unseparated(stem);
    }

    if let Some(choices) = payload.choices {
        separated.push("choices = ");
        separated.push_bind_unseparated(serde_json::to_value(choices).unwrap_or_default());
    }

    if let Some(answer_key) = payload.answer_key {
        separated.push("answer_key = ");
        separated.push_bind_unseparated(answer_key);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(importance) = payload.importance {
        separated.push("importance = ");
        separated.push_bind_unseparated(importance);
    }

    if let Some(is_bank_question) = payload.is_bank_question {
        separated.push("is_bank_question = ");
        separated.push_bind_unseparated(is_bank_question);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a bank question by ID.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
