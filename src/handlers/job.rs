// src/handlers/job.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        job::Job,
        skill::{JobSkill, Skill},
    },
};

/// Query parameters for listing skills.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// Lists the skill catalog, optionally filtered by category and search keyword.
pub async fn list_skills(
    State(pool): State<PgPool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    // Prepare search pattern
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let skills = sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, name, category, onet_importance
        FROM skills
        WHERE ($1::TEXT IS NULL OR category = $1)
          AND ($2::TEXT IS NULL OR name ILIKE $2)
        ORDER BY name
        "#,
    )
    .bind(params.category)
    .bind(search_pattern)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "skills": skills,
    })))
}

/// Retrieves a job with its ranked skill requirements.
pub async fn get_job(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))?;

    let requirements = sqlx::query_as::<_, JobSkill>(
        r#"
        SELECT job_id, skill_id, importance_level, weight, proficiency_threshold
        FROM job_skills
        WHERE job_id = $1
        ORDER BY
            CASE importance_level
                WHEN 'critical' THEN 0
                WHEN 'important' THEN 1
                ELSE 2
            END,
            weight DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "job": job,
        "skills": requirements,
    })))
}
