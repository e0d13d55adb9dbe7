// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assessment, job, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (assessments, quizzes, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let assessment_routes = Router::new()
        .route("/analyze", post(assessment::analyze_assessment))
        .route("/assemble", post(quiz::assemble_assessment))
        .route("/{id}", get(assessment::get_assessment))
        .route("/{id}/responses", post(assessment::submit_response));

    let quiz_routes = Router::new()
        .route("/{job_id}", get(quiz::get_quiz))
        .route("/{job_id}/bank/stats", get(quiz::question_bank_stats));

    let job_routes = Router::new().route("/{id}", get(job::get_job));

    let skill_routes = Router::new().route("/", get(job::list_skills));

    let invitation_routes = Router::new().route("/{user_id}", get(assessment::list_invitations));

    let admin_routes = Router::new()
        .route("/questions", post(admin::create_question))
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        );

    Router::new()
        .nest("/api/assessments", assessment_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/jobs", job_routes)
        .nest("/api/skills", skill_routes)
        .nest("/api/invitations", invitation_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
