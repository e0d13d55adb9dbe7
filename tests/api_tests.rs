// tests/api_tests.rs
//
// End-to-end tests against a real Postgres instance. They are ignored by
// default; run them with a DATABASE_URL pointing at a disposable database:
//
//   DATABASE_URL=postgres://... cargo test -- --ignored

use skillsync::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and a pool for
/// seeding.
async fn spawn_app() -> (String, PgPool) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    // 1. Create a pool
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: database_url.clone(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Seeds a job with one skill and `bank_size` bank questions for it.
/// Returns (job_id, skill_id, question_ids).
async fn seed_job_with_bank(
    pool: &PgPool,
    importance_level: &str,
    bank_size: usize,
) -> (Uuid, Uuid, Vec<Uuid>) {
    let skill_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO skills (name, category) VALUES ($1, 'technical') RETURNING id",
    )
    .bind(format!("skill_{}", &Uuid::new_v4().to_string()[..8]))
    .fetch_one(pool)
    .await
    .unwrap();

    let job_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO jobs (title, soc_code) VALUES ('Data Analyst', '15-2051') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO job_skills (job_id, skill_id, importance_level, weight) VALUES ($1, $2, $3, 1.0)",
    )
    .bind(job_id)
    .bind(skill_id)
    .bind(importance_level)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO quizzes (job_id, soc_code) VALUES ($1, '15-2051')")
        .bind(job_id)
        .execute(pool)
        .await
        .unwrap();

    let mut question_ids = Vec::new();
    for i in 0..bank_size {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO quiz_questions
            (skill_id, stem, choices, answer_key, difficulty, importance, is_bank_question)
            VALUES ($1, $2, $3, 'a', 'intermediate', 3.0, TRUE)
            RETURNING id
            "#,
        )
        .bind(skill_id)
        .bind(format!("Question {}", i))
        .bind(serde_json::json!({"a": "right", "b": "wrong"}))
        .fetch_one(pool)
        .await
        .unwrap();
        question_ids.push(id);
    }

    (job_id, skill_id, question_ids)
}

/// Attaches one more ranked skill to an existing job. Returns the skill id.
async fn seed_job_skill(pool: &PgPool, job_id: Uuid, importance_level: &str, weight: f64) -> Uuid {
    let skill_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO skills (name, category) VALUES ($1, 'technical') RETURNING id",
    )
    .bind(format!("skill_{}", &Uuid::new_v4().to_string()[..8]))
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO job_skills (job_id, skill_id, importance_level, weight) VALUES ($1, $2, $3, $4)",
    )
    .bind(job_id)
    .bind(skill_id)
    .bind(importance_level)
    .bind(weight)
    .execute(pool)
    .await
    .unwrap();

    skill_id
}

async fn seed_assessment(pool: &PgPool, job_id: Uuid) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO assessments (user_id, job_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_response(pool: &PgPool, assessment_id: Uuid, question_id: Uuid, correct: bool) {
    sqlx::query(
        "INSERT INTO quiz_responses (assessment_id, question_id, selected, is_correct) VALUES ($1, $2, $3, $4)",
    )
    .bind(assessment_id)
    .bind(question_id)
    .bind(if correct { "a" } else { "b" })
    .bind(correct)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn unknown_route_returns_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn analyze_unknown_assessment_returns_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/assessments/analyze", address))
        .json(&serde_json::json!({ "assessment_id": Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn analyze_without_responses_is_a_distinct_no_data_failure() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, _questions) = seed_job_with_bank(&pool, "critical", 3).await;
    let assessment_id = seed_assessment(&pool, job_id).await;

    let response = client
        .post(format!("{}/api/assessments/analyze", address))
        .json(&serde_json::json!({ "assessment_id": assessment_id }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    // No writes happened: the assessment is still unanalyzed.
    let readiness: Option<f64> =
        sqlx::query_scalar("SELECT readiness_pct FROM assessments WHERE id = $1")
            .bind(assessment_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(readiness.is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn analyze_is_idempotent_across_repeated_runs() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // One skill, 4 equal-importance questions, 1 correct -> 25%.
    let (job_id, skill_id, questions) = seed_job_with_bank(&pool, "critical", 4).await;
    let assessment_id = seed_assessment(&pool, job_id).await;
    seed_response(&pool, assessment_id, questions[0], true).await;
    for q in &questions[1..] {
        seed_response(&pool, assessment_id, *q, false).await;
    }

    let analyze = || async {
        client
            .post(format!("{}/api/assessments/analyze", address))
            .json(&serde_json::json!({ "assessment_id": assessment_id }))
            .send()
            .await
            .expect("Failed to execute request")
    };

    let first = analyze().await;
    assert_eq!(first.status().as_u16(), 200);
    let first_body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(first_body["success"], true);
    assert_eq!(first_body["readiness_pct"], 25.0);
    assert_eq!(first_body["status_tag"], "needs_development");

    let second = analyze().await;
    assert_eq!(second.status().as_u16(), 200);
    let second_body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second_body["readiness_pct"], first_body["readiness_pct"]);

    // Exactly one skill-result row, same values after both runs.
    let rows: Vec<(f64, String)> = sqlx::query_as(
        "SELECT score_pct, band FROM assessment_skill_results WHERE assessment_id = $1 AND skill_id = $2",
    )
    .bind(assessment_id)
    .bind(skill_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, 25.0);
    assert_eq!(rows[0].1, "needs_dev");
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn submitted_responses_are_graded_server_side() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, questions) = seed_job_with_bank(&pool, "critical", 2).await;
    let assessment_id = seed_assessment(&pool, job_id).await;

    // 'a' is the seeded answer key.
    let correct = client
        .post(format!(
            "{}/api/assessments/{}/responses",
            address, assessment_id
        ))
        .json(&serde_json::json!({ "question_id": questions[0], "selected": "a" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(correct.status().as_u16(), 201);
    let body: serde_json::Value = correct.json().await.unwrap();
    assert_eq!(body["response"]["is_correct"], true);

    let wrong = client
        .post(format!(
            "{}/api/assessments/{}/responses",
            address, assessment_id
        ))
        .json(&serde_json::json!({ "question_id": questions[1], "selected": "b" }))
        .send()
        .await
        .expect("Failed to execute request");
    let body: serde_json::Value = wrong.json().await.unwrap();
    assert_eq!(body["response"]["is_correct"], false);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn auto_invite_fires_once_above_the_visibility_threshold() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, questions) = seed_job_with_bank(&pool, "critical", 3).await;
    sqlx::query(
        "UPDATE jobs SET company_id = $1, application_url = 'https://example.com/apply', visibility_threshold_pct = 50 WHERE id = $2",
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .execute(&pool)
    .await
    .unwrap();

    // All correct -> 100%, clears the 50% threshold.
    let assessment_id = seed_assessment(&pool, job_id).await;
    for q in &questions {
        seed_response(&pool, assessment_id, *q, true).await;
    }

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/assessments/analyze", address))
            .json(&serde_json::json!({ "assessment_id": assessment_id }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);
    }

    let invite_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM employer_invitations WHERE assessment_id = $1")
            .bind(assessment_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(invite_count, 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn assemble_samples_from_the_bank_and_records_history() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, _questions) = seed_job_with_bank(&pool, "critical", 5).await;
    let user_id = Uuid::new_v4();

    let response = client
        .post(format!("{}/api/assessments/assemble", address))
        .json(&serde_json::json!({ "job_id": job_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["total_questions"], 3);

    // Delivered questions never expose the answer key.
    assert!(body["questions"][0].get("answer_key").is_none());

    let history_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_question_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(history_count, 3);

    // A second assembly still returns 3 questions even though only 2 unseen
    // remain: anti-repeat falls back to repeats instead of shrinking the
    // assessment.
    let second = client
        .post(format!("{}/api/assessments/assemble", address))
        .json(&serde_json::json!({ "job_id": job_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to execute request");
    let second_body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second_body["total_questions"], 3);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn helpful_skills_are_not_assessed() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, _questions) = seed_job_with_bank(&pool, "helpful", 5).await;

    let response = client
        .post(format!("{}/api/assessments/assemble", address))
        .json(&serde_json::json!({ "job_id": job_id, "user_id": Uuid::new_v4() }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn bank_stats_reports_per_skill_counts() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, _questions) = seed_job_with_bank(&pool, "critical", 4).await;

    let response = client
        .get(format!("{}/api/quizzes/{}/bank/stats", address, job_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total_questions"], 4);
    assert_eq!(body["avg_questions_per_skill"], 4.0);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn create_question_rejects_answer_key_outside_choices() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let skill_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO skills (name, category) VALUES ('SQL', 'technical') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let response = client
        .post(format!("{}/api/admin/questions", address))
        .json(&serde_json::json!({
            "skill_id": skill_id,
            "stem": "Which clause filters rows?",
            "choices": {"a": "WHERE", "b": "ORDER BY"},
            "answer_key": "c",
            "difficulty": "beginner"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn job_skills_are_ranked_by_importance_then_weight() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Seeded in an order that alphabetical sorting would invert: the job
    // starts with one helpful skill, then gains important and critical ones.
    let (job_id, _helpful_skill, _questions) = seed_job_with_bank(&pool, "helpful", 0).await;
    let important_skill = seed_job_skill(&pool, job_id, "important", 2.0).await;
    let critical_low = seed_job_skill(&pool, job_id, "critical", 1.0).await;
    let critical_high = seed_job_skill(&pool, job_id, "critical", 3.0).await;

    let response = client
        .get(format!("{}/api/jobs/{}", address, job_id))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let skills = body["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 4);

    // Critical before important before helpful, heavier weight first within
    // a level.
    assert_eq!(skills[0]["skill_id"], critical_high.to_string());
    assert_eq!(skills[1]["skill_id"], critical_low.to_string());
    assert_eq!(skills[2]["skill_id"], important_skill.to_string());
    assert_eq!(skills[3]["importance_level"], "helpful");
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn update_question_rejects_answer_key_outside_choices() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Seeded bank questions answer 'a' with choices {a, b}.
    let (_job_id, _skill_id, questions) = seed_job_with_bank(&pool, "critical", 1).await;
    let question_id = questions[0];
    let url = format!("{}/api/admin/questions/{}", address, question_id);

    // Patching in a key that no choice carries is rejected.
    let bad_key = client
        .put(&url)
        .json(&serde_json::json!({ "answer_key": "z" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(bad_key.status().as_u16(), 400);

    // So is replacing the choices in a way that drops the stored key.
    let bad_choices = client
        .put(&url)
        .json(&serde_json::json!({ "choices": {"x": "WHERE", "y": "ORDER BY"} }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(bad_choices.status().as_u16(), 400);

    // The stored key survived both rejected patches.
    let stored_key: String =
        sqlx::query_scalar("SELECT answer_key FROM quiz_questions WHERE id = $1")
            .bind(question_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored_key, "a");

    // A patch that keeps key and choices consistent goes through.
    let consistent = client
        .put(&url)
        .json(&serde_json::json!({
            "choices": {"x": "WHERE", "y": "ORDER BY"},
            "answer_key": "x"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(consistent.status().as_u16(), 200);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn duplicate_response_submissions_conflict() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (job_id, _skill_id, questions) = seed_job_with_bank(&pool, "critical", 1).await;
    let assessment_id = seed_assessment(&pool, job_id).await;

    let submit = || async {
        client
            .post(format!(
                "{}/api/assessments/{}/responses",
                address, assessment_id
            ))
            .json(&serde_json::json!({ "question_id": questions[0], "selected": "a" }))
            .send()
            .await
            .expect("Failed to execute request")
    };

    assert_eq!(submit().await.status().as_u16(), 201);
    assert_eq!(submit().await.status().as_u16(), 409);

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_responses WHERE assessment_id = $1")
            .bind(assessment_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn skill_catalog_uses_the_standard_envelope() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_job_id, skill_id, _questions) = seed_job_with_bank(&pool, "critical", 0).await;

    let response = client
        .get(format!("{}/api/skills?category=technical", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let listed = body["skills"].as_array().unwrap();
    assert!(
        listed
            .iter()
            .any(|s| s["id"] == skill_id.to_string())
    );
}
