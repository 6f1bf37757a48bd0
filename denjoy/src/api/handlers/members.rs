//! HTTP handler for hospital member invitations.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    AppState,
    api::{
        envelope::{ApiJson, ApiResult, RequestId},
        models::members::{MemberInviteRequest, MemberInvited},
    },
    auth::{current_user::CurrentUser, permissions},
    crypto::generate_token,
    db::models::member_invitations::MemberInvitationCreateDBRequest,
    email::InvitationEmail,
    errors::{Error, Result},
    types::abbrev_uuid,
    validation::{bounded_text, validate_email},
};

const MAX_NAME_CHARS: usize = 100;

/// Invite someone to the caller's hospital.
#[utoipa::path(
    post,
    path = "/functions/v1/invite-member",
    tag = "members",
    summary = "Invite hospital member",
    description = "Creates a pending invitation with a 7-day token and emails the invite link.",
    request_body = MemberInviteRequest,
    responses(
        (status = 201, description = "Invitation sent", body = MemberInvited),
        (status = 400, description = "Invalid input or email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not a hospital master"),
        (status = 409, description = "An invitation for this email is already pending"),
        (status = 500, description = "Email delivery or database failure"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn invite_member(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<MemberInviteRequest>,
) -> ApiResult<MemberInvited> {
    request_id.wrap_with(StatusCode::CREATED, invite(&state, &current_user, request).await)
}

async fn invite(state: &AppState, current_user: &CurrentUser, request: MemberInviteRequest) -> Result<MemberInvited> {
    let (_, hospital_id) = permissions::require_hospital_manager(current_user)?;

    let email = validate_email(&request.email)?;
    let name = bounded_text("name", &request.name, 1, MAX_NAME_CHARS)?;

    if current_user.email().is_some_and(|own| own.eq_ignore_ascii_case(&email)) {
        return Err(Error::InvalidInput {
            message: "You cannot invite yourself".to_string(),
        });
    }

    let ttl = chrono::Duration::from_std(state.config.members.invitation_ttl).map_err(|e| Error::Internal {
        operation: format!("convert invitation ttl: {e}"),
    })?;

    let hospital_name = state.store.get_hospital_name(hospital_id).await?;

    let invitation = state
        .store
        .create_member_invitation(&MemberInvitationCreateDBRequest {
            hospital_id,
            email,
            name,
            role: request.role,
            token: generate_token(),
            invited_by: current_user.id,
            expires_at: Utc::now() + ttl,
        })
        .await?;

    let sent = state
        .email
        .send_member_invitation(&InvitationEmail {
            to_email: &invitation.email,
            to_name: &invitation.name,
            inviter_name: current_user.display_name(),
            hospital_name: hospital_name.as_deref(),
            role: invitation.role,
            token: &invitation.token,
            expires_at: invitation.expires_at,
        })
        .await;

    // An undelivered invitation must not hold the pending slot for this address
    if let Err(e) = sent {
        if let Err(cleanup) = state.store.delete_member_invitation(invitation.id).await {
            warn!(
                invitation_id = %abbrev_uuid(&invitation.id),
                error = %cleanup,
                "Failed to remove undelivered invitation"
            );
        }
        return Err(e);
    }

    info!(
        invitation_id = %abbrev_uuid(&invitation.id),
        hospital_id = %abbrev_uuid(&hospital_id),
        role = ?invitation.role,
        "Member invitation sent"
    );

    Ok(MemberInvited {
        invitation_id: invitation.id,
        expires_at: invitation.expires_at,
    })
}
