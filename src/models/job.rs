// src/models/job.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'jobs' table: a role candidates can assess against.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,

    /// Standard Occupational Classification code for the role.
    pub soc_code: String,

    pub company_id: Option<Uuid>,

    /// Where qualified candidates are sent by the auto-invite.
    pub application_url: Option<String>,

    /// Overall readiness at or above this triggers the employer invite.
    /// None falls back to the global default (85).
    pub visibility_threshold_pct: Option<f64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
