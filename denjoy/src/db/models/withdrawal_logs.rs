//! Database models for account withdrawal records.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::UserId;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct WithdrawalLog {
    pub id: Uuid,
    pub user_id: UserId,
    pub email: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request for recording a withdrawal
#[derive(Debug, Clone)]
pub struct WithdrawalLogCreateDBRequest {
    pub user_id: UserId,
    pub email: Option<String>,
    pub reason: Option<String>,
}
