// src/handlers/assessment.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::DEFAULT_VISIBILITY_THRESHOLD,
    engine::scoring::{
        self, BandedSkill, ScoredResponse, SkillScore,
    },
    error::AppError,
    models::{
        assessment::{AnalyzeRequest, Assessment, AssessmentSkillResult, QuizResponse},
        invitation::EmployerInvitation,
    },
};

/// Helper struct for the assessment + job lookup.
#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: Uuid,
    user_id: Uuid,
    job_id: Uuid,
    company_id: Option<Uuid>,
    application_url: Option<String>,
    visibility_threshold_pct: Option<f64>,
}

/// Helper struct for responses joined with their question and section,
/// carrying everything scoring needs.
#[derive(sqlx::FromRow)]
struct ResponseRow {
    is_correct: bool,
    importance: Option<f64>,
    skill_id: Option<Uuid>,
}

/// Helper struct for per-skill threshold overrides.
#[derive(sqlx::FromRow)]
struct ThresholdRow {
    skill_id: Uuid,
    proficiency_threshold: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct SkillNameRow {
    id: Uuid,
    name: String,
}

/// Analyzes a finished assessment.
///
/// * Computes the weighted score and band per skill.
/// * Aggregates per-skill scores into overall role readiness.
/// * Upserts skill results and overwrites the assessment's readiness fields,
///   so repeated analysis is idempotent.
/// * Fires the auto-invite side effect when readiness clears the job's
///   visibility threshold (best effort, never fails the analysis).
pub async fn analyze_assessment(
    State(pool): State<PgPool>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Assessment with its job context.
    let assessment = sqlx::query_as::<_, AssessmentRow>(
        r#"
        SELECT
            a.id,
            a.user_id,
            a.job_id,
            j.company_id,
            j.application_url,
            j.visibility_threshold_pct
        FROM assessments a
        JOIN jobs j ON j.id = a.job_id
        WHERE a.id = $1
        "#,
    )
    .bind(req.assessment_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    // 2. Recorded responses with question importance and the skill the
    // question's section is bound to (falling back to the question's own
    // skill for bank questions delivered outside a section).
    let responses = sqlx::query_as::<_, ResponseRow>(
        r#"
        SELECT
            r.is_correct,
            q.importance,
            COALESCE(s.skill_id, q.skill_id) AS skill_id
        FROM quiz_responses r
        JOIN quiz_questions q ON q.id = r.question_id
        LEFT JOIN quiz_sections s ON s.id = q.section_id
        WHERE r.assessment_id = $1
        "#,
    )
    .bind(assessment.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz responses: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if responses.is_empty() {
        return Err(AppError::NoData(
            "No quiz responses found for this assessment".to_string(),
        ));
    }

    // 3. The job must still have its quiz.
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM quizzes WHERE job_id = $1")
        .bind(assessment.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found for this job".to_string()))?;

    // 4. Per-skill threshold overrides for this job.
    let thresholds = sqlx::query_as::<_, ThresholdRow>(
        "SELECT skill_id, proficiency_threshold FROM job_skills WHERE job_id = $1",
    )
    .bind(assessment.job_id)
    .fetch_all(&pool)
    .await?;

    let threshold_map: HashMap<Uuid, Option<f64>> = thresholds
        .into_iter()
        .map(|t| (t.skill_id, t.proficiency_threshold))
        .collect();

    // 5. Score.
    let scored: Vec<ScoredResponse> = responses
        .iter()
        .map(|r| ScoredResponse {
            skill_id: r.skill_id,
            is_correct: r.is_correct,
            importance: r.importance,
        })
        .collect();

    let skill_scores = scoring::score_skills(&scored);
    let overall = scoring::overall_readiness(&skill_scores).ok_or(AppError::NoData(
        "No scorable skills in this assessment".to_string(),
    ))?;
    let tag = scoring::status_tag(overall);

    for score in &skill_scores {
        tracing::debug!(
            "Skill {:?}: raw={:.1}%, weighted={:.1}% over {} answers",
            score.skill_id,
            score.raw_score,
            score.weighted_score,
            score.answered
        );
    }

    // 6. Persist skill results (upsert keyed on assessment_id + skill_id).
    // Responses whose section never had a skill are scored into the overall
    // mean but have no skill row to attach a result to.
    let skill_results = banded_results(assessment.id, &skill_scores, &threshold_map);
    for result in &skill_results {
        sqlx::query(
            r#"
            INSERT INTO assessment_skill_results (assessment_id, skill_id, score_pct, band)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assessment_id, skill_id)
            DO UPDATE SET score_pct = EXCLUDED.score_pct, band = EXCLUDED.band
            "#,
        )
        .bind(result.assessment_id)
        .bind(result.skill_id)
        .bind(result.score_pct)
        .bind(&result.band)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert skill result: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    // 7. Overwrite the assessment's readiness fields.
    let analyzed_at = chrono::Utc::now();
    sqlx::query(
        "UPDATE assessments SET readiness_pct = $1, status_tag = $2, analyzed_at = $3 WHERE id = $4",
    )
    .bind(overall)
    .bind(tag.as_str())
    .bind(analyzed_at)
    .bind(assessment.id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update assessment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // 8. Resolve skill names and classify.
    let skill_ids: Vec<Uuid> = skill_scores.iter().filter_map(|s| s.skill_id).collect();
    let names = sqlx::query_as::<_, SkillNameRow>("SELECT id, name FROM skills WHERE id = ANY($1)")
        .bind(&skill_ids)
        .fetch_all(&pool)
        .await?;
    let name_map: HashMap<Uuid, String> = names.into_iter().map(|n| (n.id, n.name)).collect();

    let banded: Vec<BandedSkill> = skill_scores
        .iter()
        .filter_map(|score| {
            let skill_id = score.skill_id?;
            Some(BandedSkill {
                skill_name: name_map
                    .get(&skill_id)
                    .cloned()
                    .unwrap_or_else(|| skill_id.to_string()),
                score: score.weighted_score,
                band: scoring::band_for(
                    score.weighted_score,
                    threshold_map.get(&skill_id).copied().flatten(),
                ),
            })
        })
        .collect();

    let summary = scoring::summarize(overall, &banded);
    let role_readiness = scoring::readiness_level(overall, summary.critical_gaps.len());

    // 9. Auto-invite side effect.
    maybe_create_invite(&pool, &assessment, overall).await;

    tracing::info!(
        "Assessment {} analyzed: {:.1}% ({})",
        assessment.id,
        overall,
        tag.as_str()
    );

    // 10. Respond.
    Ok(Json(serde_json::json!({
        "success": true,
        "readiness_pct": overall,
        "status_tag": tag.as_str(),
        "role_readiness": role_readiness,
        "skill_results": skill_results,
        "analyzed_at": analyzed_at,
        "summary": {
            "overall_proficiency": summary.overall_proficiency,
            "strength_areas": summary.strength_areas,
            "development_areas": summary.development_areas,
            "critical_gaps": summary.critical_gaps,
            "next_steps": summary.next_steps,
        }
    })))
}

/// Retrieves an assessment with its stored skill results.
pub async fn get_assessment(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    let skill_results = sqlx::query_as::<_, AssessmentSkillResult>(
        "SELECT assessment_id, skill_id, score_pct, band FROM assessment_skill_results WHERE assessment_id = $1",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "assessment": assessment,
        "skill_results": skill_results,
    })))
}

/// DTO for submitting one answer.
#[derive(Debug, Deserialize)]
pub struct SubmitResponseRequest {
    pub question_id: Uuid,
    pub selected: String,
}

/// Records one answer event, grading it server-side against the question's
/// answer key (strict string matching).
pub async fn submit_response(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM assessments WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Assessment not found".to_string()))?;

    let answer_key =
        sqlx::query_scalar::<_, String>("SELECT answer_key FROM quiz_questions WHERE id = $1")
            .bind(req.question_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let is_correct = req.selected == answer_key;

    let response = sqlx::query_as::<_, QuizResponse>(
        r#"
        INSERT INTO quiz_responses (assessment_id, question_id, selected, is_correct)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.question_id)
    .bind(&req.selected)
    .bind(is_correct)
    .fetch_one(&pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
            "A response for this question was already recorded".to_string(),
        ),
        e => {
            tracing::error!("Failed to record quiz response: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "response": response })),
    ))
}

/// Lists a user's employer invitations, newest first.
pub async fn list_invitations(
    State(pool): State<PgPool>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invitations = sqlx::query_as::<_, EmployerInvitation>(
        "SELECT * FROM employer_invitations WHERE user_id = $1 ORDER BY invited_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "invitations": invitations,
    })))
}

/// Maps per-skill scores to persistable result rows with bands derived from
/// the job's threshold overrides.
fn banded_results(
    assessment_id: Uuid,
    skill_scores: &[SkillScore],
    threshold_map: &HashMap<Uuid, Option<f64>>,
) -> Vec<AssessmentSkillResult> {
    skill_scores
        .iter()
        .filter_map(|score| {
            let skill_id = score.skill_id?;
            let custom = threshold_map.get(&skill_id).copied().flatten();
            Some(AssessmentSkillResult {
                assessment_id,
                skill_id,
                score_pct: score.weighted_score,
                band: scoring::band_for(score.weighted_score, custom)
                    .as_str()
                    .to_string(),
            })
        })
        .collect()
}

/// Creates the employer invitation when readiness clears the job's
/// visibility threshold. Idempotent per assessment (check-then-insert; the
/// small race window is an accepted limitation of this best-effort path).
/// Failures are logged and never propagate.
async fn maybe_create_invite(pool: &PgPool, assessment: &AssessmentRow, overall: f64) {
    let threshold = assessment
        .visibility_threshold_pct
        .unwrap_or(DEFAULT_VISIBILITY_THRESHOLD);

    if overall < threshold {
        tracing::debug!(
            "Proficiency {:.1}% below visibility threshold {:.1}% - no invite",
            overall,
            threshold
        );
        return;
    }

    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM employer_invitations WHERE assessment_id = $1",
    )
    .bind(assessment.id)
    .fetch_optional(pool)
    .await;

    match existing {
        Ok(Some(_)) => {
            tracing::debug!("Invite already exists for assessment {}", assessment.id);
        }
        Ok(None) => {
            let (Some(company_id), Some(application_url)) =
                (assessment.company_id, assessment.application_url.as_deref())
            else {
                tracing::warn!(
                    "Assessment {} qualifies for an invite but the job lacks company_id or application_url",
                    assessment.id
                );
                return;
            };

            let inserted = sqlx::query(
                r#"
                INSERT INTO employer_invitations
                (user_id, company_id, job_id, assessment_id, proficiency_pct, application_url, status, invited_at)
                VALUES ($1, $2, $3, $4, $5, $6, 'sent', $7)
                "#,
            )
            .bind(assessment.user_id)
            .bind(company_id)
            .bind(assessment.job_id)
            .bind(assessment.id)
            .bind(overall)
            .bind(application_url)
            .bind(chrono::Utc::now())
            .execute(pool)
            .await;

            match inserted {
                Ok(_) => tracing::info!("Auto-invite created for assessment {}", assessment.id),
                Err(e) => tracing::warn!("Failed to create auto-invite: {:?}", e),
            }
        }
        Err(e) => tracing::warn!("Failed to check existing invite: {:?}", e),
    }
}
