//! HTTP handlers for beta invite codes.

use axum::{extract::State, http::StatusCode};
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        envelope::{ApiJson, ApiPath, ApiResult, RequestId},
        models::invite_codes::{
            InviteCodeConsumed, InviteCodeCreate, InviteCodeEnvelope, InviteCodeInput, InviteCodeList, InviteCodeToggle,
            InviteCodeVerifyResponse,
        },
    },
    auth::{current_user::CurrentUser, permissions},
    db::{
        errors::DbError,
        models::invite_codes::{InviteCodeFilter, InviteCodeUpdateDBRequest},
    },
    errors::{Error, Result},
    invite_codes::{issue_code, normalize_code},
    types::{InviteCodeId, Operation, Resource, abbrev_uuid},
    validation::optional_text,
};

const MAX_MEMO_CHARS: usize = 500;

fn code_from_input(input: &InviteCodeInput) -> Result<String> {
    let code = normalize_code(&input.code);
    if code.is_empty() {
        return Err(Error::InvalidInput {
            message: "code is required".to_string(),
        });
    }
    Ok(code)
}

/// Generate a new invite code.
#[utoipa::path(
    post,
    path = "/functions/v1/beta-invite-codes",
    tag = "invite_codes",
    summary = "Create invite code",
    request_body = InviteCodeCreate,
    responses(
        (status = 201, description = "Invite code created", body = InviteCodeEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Could not generate a unique code"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_invite_code(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<InviteCodeCreate>,
) -> ApiResult<InviteCodeEnvelope> {
    request_id.wrap_with(StatusCode::CREATED, create(&state, &current_user, request).await)
}

async fn create(state: &AppState, current_user: &CurrentUser, request: InviteCodeCreate) -> Result<InviteCodeEnvelope> {
    permissions::require_platform_admin(current_user, Operation::Create, Resource::InviteCodes)?;

    let memo = optional_text("memo", request.memo.as_deref(), MAX_MEMO_CHARS)?;
    let code = issue_code(
        state.store.as_ref(),
        &state.config.invite_codes,
        request.usage_mode,
        memo,
        Some(current_user.id),
    )
    .await?;

    info!(code_id = %abbrev_uuid(&code.id), usage_mode = ?code.usage_mode, "Invite code issued");

    Ok(InviteCodeEnvelope { invite_code: code.into() })
}

/// List all invite codes, newest first.
#[utoipa::path(
    get,
    path = "/functions/v1/beta-invite-codes",
    tag = "invite_codes",
    summary = "List invite codes",
    responses(
        (status = 200, description = "All invite codes", body = InviteCodeList),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_invite_codes(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
) -> ApiResult<InviteCodeList> {
    request_id.wrap(list(&state, &current_user).await)
}

async fn list(state: &AppState, current_user: &CurrentUser) -> Result<InviteCodeList> {
    permissions::require_platform_admin(current_user, Operation::Read, Resource::InviteCodes)?;

    let codes = state.store.list_invite_codes(&InviteCodeFilter::default()).await?;
    Ok(InviteCodeList {
        invite_codes: codes.into_iter().map(Into::into).collect(),
    })
}

/// Activate or deactivate a code.
#[utoipa::path(
    patch,
    path = "/functions/v1/beta-invite-codes/{id}",
    tag = "invite_codes",
    summary = "Toggle invite code",
    params(("id" = uuid::Uuid, Path, description = "Invite code ID")),
    request_body = InviteCodeToggle,
    responses(
        (status = 200, description = "Updated invite code", body = InviteCodeEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Invite code not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn toggle_invite_code(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiPath(id): ApiPath<InviteCodeId>,
    ApiJson(request): ApiJson<InviteCodeToggle>,
) -> ApiResult<InviteCodeEnvelope> {
    request_id.wrap(toggle(&state, &current_user, id, request.is_active).await)
}

async fn toggle(state: &AppState, current_user: &CurrentUser, id: InviteCodeId, is_active: bool) -> Result<InviteCodeEnvelope> {
    permissions::require_platform_admin(current_user, Operation::Update, Resource::InviteCodes)?;

    let code = match state.store.update_invite_code(id, &InviteCodeUpdateDBRequest { is_active }).await {
        Ok(code) => code,
        Err(DbError::NotFound) => {
            return Err(Error::NotFound {
                resource: "Invite code".to_string(),
                id: id.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    info!(code_id = %abbrev_uuid(&code.id), is_active, "Invite code toggled");

    Ok(InviteCodeEnvelope { invite_code: code.into() })
}

/// Check whether a code may be used for signup.
#[utoipa::path(
    post,
    path = "/functions/v1/beta-invite-codes/verify",
    tag = "invite_codes",
    summary = "Verify invite code",
    request_body = InviteCodeInput,
    responses(
        (status = 200, description = "Verification result", body = InviteCodeVerifyResponse),
        (status = 400, description = "Missing code"),
    )
)]
#[instrument(skip_all)]
pub async fn verify_invite_code(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<InviteCodeInput>,
) -> ApiResult<InviteCodeVerifyResponse> {
    request_id.wrap(verify(&state, request).await)
}

async fn verify(state: &AppState, request: InviteCodeInput) -> Result<InviteCodeVerifyResponse> {
    let code = code_from_input(&request)?;
    let verification = state.store.verify_invite_code(&code).await?;
    Ok(verification.into())
}

/// Mark a code as used by the caller.
#[utoipa::path(
    post,
    path = "/functions/v1/beta-invite-codes/consume",
    tag = "invite_codes",
    summary = "Consume invite code",
    request_body = InviteCodeInput,
    responses(
        (status = 200, description = "Code consumed", body = InviteCodeConsumed),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Code unknown, inactive or already used"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn consume_invite_code(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<InviteCodeInput>,
) -> ApiResult<InviteCodeConsumed> {
    request_id.wrap(consume(&state, &current_user, request).await)
}

async fn consume(state: &AppState, current_user: &CurrentUser, request: InviteCodeInput) -> Result<InviteCodeConsumed> {
    let code = code_from_input(&request)?;

    if !state.store.consume_invite_code(&code, current_user.id).await? {
        return Err(Error::Conflict {
            message: "Invite code is invalid or has already been used".to_string(),
        });
    }

    info!(user_id = %abbrev_uuid(&current_user.id), "Invite code consumed");

    Ok(InviteCodeConsumed { code })
}
