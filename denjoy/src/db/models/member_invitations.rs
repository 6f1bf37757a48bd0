//! Database models for hospital member invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{HospitalId, InvitationId, UserId};

/// Role the invitee receives on acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Staff,
    Master,
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct MemberInvitation {
    pub id: InvitationId,
    pub hospital_id: HospitalId,
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub token: String,
    pub invited_by: UserId,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Request for creating an invitation
#[derive(Debug, Clone)]
pub struct MemberInvitationCreateDBRequest {
    pub hospital_id: HospitalId,
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub token: String,
    pub invited_by: UserId,
    pub expires_at: DateTime<Utc>,
}
