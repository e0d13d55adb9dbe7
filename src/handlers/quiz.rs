// src/handlers/quiz.rs

use std::collections::{BTreeMap, HashSet};

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::{
    config::{HISTORY_EXCLUDE_DAYS, MAX_ASSESSMENT_SKILLS, QUESTIONS_PER_SKILL},
    engine::sampler::{self, ImportanceLevel, RankedSkill},
    error::AppError,
    models::{
        assessment::AssembleRequest,
        question::{PublicQuestion, QuizQuestion},
        quiz::{Quiz, QuizSection},
    },
};

/// Retrieves a job's quiz with its ordered sections.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE job_id = $1")
        .bind(job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found for this job".to_string()))?;

    let sections = sqlx::query_as::<_, QuizSection>(
        "SELECT * FROM quiz_sections WHERE quiz_id = $1 ORDER BY position",
    )
    .bind(quiz.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "quiz": quiz,
        "sections": sections,
    })))
}

/// Helper struct for job skills joined with their skill record.
#[derive(sqlx::FromRow)]
struct JobSkillRow {
    skill_id: Uuid,
    name: String,
    importance_level: String,
    weight: f64,
}

/// Assembles a new assessment from the question bank.
///
/// * Selects the job's top critical/important skills (max 7).
/// * Samples 3 unseen bank questions per skill, falling back to repeats
///   when the user has exhausted a skill's bank.
/// * Creates the assessment row and records question history so future
///   assemblies avoid these questions.
/// * Answer keys are stripped from the delivered questions.
pub async fn assemble_assessment(
    State(pool): State<PgPool>,
    Json(req): Json<AssembleRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Job must exist.
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM jobs WHERE id = $1")
        .bind(req.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Job not found".to_string()))?;

    // Ranked skills for the job.
    let job_skills = sqlx::query_as::<_, JobSkillRow>(
        r#"
        SELECT js.skill_id, s.name, js.importance_level, js.weight
        FROM job_skills js
        JOIN skills s ON s.id = js.skill_id
        WHERE js.job_id = $1
        "#,
    )
    .bind(req.job_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch job skills: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let ranked: Vec<RankedSkill> = job_skills
        .into_iter()
        .filter_map(|row| {
            let Some(level) = ImportanceLevel::parse(&row.importance_level) else {
                tracing::warn!(
                    "Skipping skill {} with unknown importance level '{}'",
                    row.skill_id,
                    row.importance_level
                );
                return None;
            };
            Some(RankedSkill {
                skill_id: row.skill_id,
                name: row.name,
                importance_level: level,
                weight: row.weight,
            })
        })
        .collect();

    let top_skills = sampler::select_top_skills(ranked, MAX_ASSESSMENT_SKILLS);
    if top_skills.is_empty() {
        return Err(AppError::NoData(
            "No critical or important skills available for this job".to_string(),
        ));
    }

    // Questions the user saw recently, excluded from sampling.
    let cutoff = Utc::now() - Duration::days(HISTORY_EXCLUDE_DAYS);
    let seen: Vec<Uuid> = sqlx::query_scalar::<_, Uuid>(
        "SELECT question_id FROM user_question_history WHERE user_id = $1 AND seen_at >= $2",
    )
    .bind(req.user_id)
    .bind(cutoff)
    .fetch_all(&pool)
    .await?;
    let seen: HashSet<Uuid> = seen.into_iter().collect();

    // Sample per skill. An empty bank skips the skill rather than failing
    // the whole assembly.
    let mut questions: Vec<PublicQuestion> = Vec::new();
    let mut sampled_ids: Vec<Uuid> = Vec::new();

    for skill in &top_skills {
        let bank = sqlx::query_as::<_, QuizQuestion>(
            "SELECT * FROM quiz_questions WHERE skill_id = $1 AND is_bank_question = TRUE",
        )
        .bind(skill.skill_id)
        .fetch_all(&pool)
        .await?;

        if bank.is_empty() {
            tracing::warn!("Question bank is empty for skill '{}'", skill.name);
            continue;
        }

        let picked = {
            let mut rng = rand::thread_rng();
            sampler::sample_questions(bank, &seen, QUESTIONS_PER_SKILL, |q| q.id, &mut rng)
        };

        tracing::debug!("{}: {} questions sampled", skill.name, picked.len());

        for question in picked {
            sampled_ids.push(question.id);
            questions.push(PublicQuestion::from_question(question, &skill.name));
        }
    }

    if questions.is_empty() {
        return Err(AppError::NoData(
            "No bank questions available for this job's skills".to_string(),
        ));
    }

    // Create the assessment and remember what the user saw.
    let assessment_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO assessments (user_id, job_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(req.user_id)
    .bind(req.job_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    record_question_history(&pool, req.user_id, assessment_id, &sampled_ids).await?;

    let total_questions = questions.len();
    tracing::info!(
        "Assembled assessment {}: {} questions across {} skills",
        assessment_id,
        total_questions,
        top_skills.len()
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "assessment_id": assessment_id,
        "skills": top_skills
            .iter()
            .map(|s| serde_json::json!({
                "skill_id": s.skill_id,
                "name": s.name,
                "importance_level": s.importance_level.as_str(),
                "weight": s.weight,
            }))
            .collect::<Vec<_>>(),
        "questions": questions,
        "total_questions": total_questions,
    })))
}

/// Inserts history rows and bumps usage counters for the sampled questions.
async fn record_question_history(
    pool: &PgPool,
    user_id: Uuid,
    assessment_id: Uuid,
    question_ids: &[Uuid],
) -> Result<(), AppError> {
    let seen_at = Utc::now();

    let mut builder = sqlx::QueryBuilder::<Postgres>::new(
        "INSERT INTO user_question_history (user_id, question_id, assessment_id, seen_at) ",
    );
    builder.push_values(question_ids, |mut b, qid| {
        b.push_bind(user_id)
            .push_bind(*qid)
            .push_bind(assessment_id)
            .push_bind(seen_at);
    });
    builder.build().execute(pool).await.map_err(|e| {
        tracing::error!("Failed to record question history: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    sqlx::query(
        "UPDATE quiz_questions SET times_used = times_used + 1, last_used_at = $1 WHERE id = ANY($2)",
    )
    .bind(seen_at)
    .bind(question_ids)
    .execute(pool)
    .await?;

    Ok(())
}

/// Helper struct for bank counts per skill.
#[derive(sqlx::FromRow)]
struct BankCountRow {
    name: String,
    question_count: i64,
}

/// Reports question bank coverage for a job: total bank questions, counts
/// per skill, and the average per skill.
pub async fn question_bank_stats(
    State(pool): State<PgPool>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let counts = sqlx::query_as::<_, BankCountRow>(
        r#"
        SELECT s.name, COUNT(q.id) AS question_count
        FROM job_skills js
        JOIN skills s ON s.id = js.skill_id
        LEFT JOIN quiz_questions q
            ON q.skill_id = js.skill_id AND q.is_bank_question = TRUE
        WHERE js.job_id = $1
        GROUP BY s.name
        ORDER BY s.name
        "#,
    )
    .bind(job_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch bank stats: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if counts.is_empty() {
        return Err(AppError::NotFound("No skills found for this job".to_string()));
    }

    let total: i64 = counts.iter().map(|c| c.question_count).sum();
    let by_skill: BTreeMap<String, i64> = counts
        .into_iter()
        .map(|c| (c.name, c.question_count))
        .collect();
    let avg = total as f64 / by_skill.len() as f64;

    Ok(Json(serde_json::json!({
        "success": true,
        "total_questions": total,
        "by_skill": by_skill,
        "avg_questions_per_skill": avg,
    })))
}
