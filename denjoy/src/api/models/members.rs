//! API request and response models for hospital member invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::models::member_invitations::MemberRole, types::InvitationId};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberInviteRequest {
    pub email: String,
    pub name: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberInvited {
    #[schema(value_type = String, format = "uuid")]
    pub invitation_id: InvitationId,
    pub expires_at: DateTime<Utc>,
}
