// src/models/skill.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'skills' table. Immutable reference data created by
/// administrators or enrichment scripts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,

    /// O*NET importance rating (1.0-5.0), where available.
    pub onet_importance: Option<f64>,
}

/// Represents the 'job_skills' join table: one skill required by one job,
/// with its employer ranking.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JobSkill {
    pub job_id: Uuid,
    pub skill_id: Uuid,

    /// 'critical', 'important' or 'helpful'.
    pub importance_level: String,

    /// Numeric ranking weight; breaks ties within an importance level.
    pub weight: f64,

    /// Job-specific proficiency threshold (0-100). None falls back to the
    /// global defaults.
    pub proficiency_threshold: Option<f64>,
}
