// src/models/invitation.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'employer_invitations' table. Created at most once per
/// assessment by the auto-invite side effect when readiness clears the
/// job's visibility threshold.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmployerInvitation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub job_id: Uuid,
    pub assessment_id: Uuid,
    pub proficiency_pct: f64,
    pub application_url: String,
    pub status: String,
    pub invited_at: Option<chrono::DateTime<chrono::Utc>>,
}
