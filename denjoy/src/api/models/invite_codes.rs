//! API request and response models for beta invite codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::invite_codes::{InviteCode, InviteCodeVerification, UsageMode},
    types::{InviteCodeId, UserId},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteCodeCreate {
    pub usage_mode: UsageMode,
    /// Free-form note, e.g. the event the code was handed out at
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteCodeToggle {
    pub is_active: bool,
}

/// A code typed in by a user. Case and surrounding whitespace are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteCodeInput {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteCodeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InviteCodeId,
    pub code: String,
    pub usage_mode: UsageMode,
    pub is_active: bool,
    pub verify_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub used_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InviteCode> for InviteCodeResponse {
    fn from(code: InviteCode) -> Self {
        Self {
            id: code.id,
            code: code.code,
            usage_mode: code.usage_mode,
            is_active: code.is_active,
            verify_count: code.verify_count,
            last_verified_at: code.last_verified_at,
            used_at: code.used_at,
            used_by: code.used_by,
            memo: code.memo,
            created_at: code.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteCodeEnvelope {
    pub invite_code: InviteCodeResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteCodeList {
    pub invite_codes: Vec<InviteCodeResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteCodeVerifyResponse {
    pub valid: bool,
    /// Why the code was refused: `not_found`, `inactive`, `already_used` or `already_verified`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_mode: Option<UsageMode>,
}

impl From<InviteCodeVerification> for InviteCodeVerifyResponse {
    fn from(verification: InviteCodeVerification) -> Self {
        Self {
            valid: verification.valid,
            reason: verification.reason,
            usage_mode: verification.usage_mode,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InviteCodeConsumed {
    pub code: String,
}
