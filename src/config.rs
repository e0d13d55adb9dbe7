// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Default proficiency threshold for the `proficient` band when a job
/// carries no custom threshold for the skill.
pub const DEFAULT_PROFICIENT_THRESHOLD: f64 = 80.0;

/// Default lower bound of the `building` band. With a custom threshold the
/// building bound is `custom - CUSTOM_BUILDING_OFFSET` instead.
pub const DEFAULT_BUILDING_THRESHOLD: f64 = 60.0;

/// Offset subtracted from a custom proficiency threshold to obtain the
/// building bound for that skill.
pub const CUSTOM_BUILDING_OFFSET: f64 = 20.0;

/// Neutral question importance (1.0-5.0 scale) applied when a question row
/// has no importance recorded.
pub const DEFAULT_QUESTION_IMPORTANCE: f64 = 3.0;

/// Overall readiness at or above this is `role_ready`.
pub const ROLE_READY_THRESHOLD: f64 = 80.0;

/// Overall readiness at or above this (and below role-ready) is `close_gaps`.
pub const CLOSE_GAPS_THRESHOLD: f64 = 60.0;

/// Default visibility threshold for the auto-invite side effect when the
/// job does not override it.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 85.0;

/// Maximum number of skills tested in one assessment.
pub const MAX_ASSESSMENT_SKILLS: usize = 7;

/// Questions sampled per selected skill.
pub const QUESTIONS_PER_SKILL: usize = 3;

/// Questions a user saw within this many days are excluded from sampling.
pub const HISTORY_EXCLUDE_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            rust_log,
        }
    }
}
