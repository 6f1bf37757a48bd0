//! Database models for beta invite codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{InviteCodeId, UserId};

/// How many times a code may be consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UsageMode {
    /// Consumable once
    Single,
    Unlimited,
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct InviteCode {
    pub id: InviteCodeId,
    pub code: String,
    pub usage_mode: UsageMode,
    pub is_active: bool,
    pub verify_count: i32,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<UserId>,
    pub memo: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Request for inserting a freshly generated code
#[derive(Debug, Clone)]
pub struct InviteCodeCreateDBRequest {
    pub code: String,
    pub usage_mode: UsageMode,
    pub memo: Option<String>,
    pub created_by: Option<UserId>,
}

/// Request for updating a code
#[derive(Debug, Clone)]
pub struct InviteCodeUpdateDBRequest {
    pub is_active: bool,
}

/// Filter for listing codes
#[derive(Debug, Clone, Default)]
pub struct InviteCodeFilter {
    pub is_active: Option<bool>,
}

/// Row returned by `verify_beta_invite_code`
#[derive(Debug, Clone, FromRow)]
pub struct InviteCodeVerification {
    pub valid: bool,
    pub reason: Option<String>,
    pub usage_mode: Option<UsageMode>,
}
