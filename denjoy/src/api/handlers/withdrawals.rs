//! HTTP handler for account withdrawal notices.

use axum::extract::State;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        envelope::{Acknowledged, ApiJson, ApiResult, RequestId},
        models::withdrawals::WithdrawalRequest,
    },
    auth::current_user::CurrentUser,
    db::models::withdrawal_logs::WithdrawalLogCreateDBRequest,
    errors::Result,
    notifications::{spawn_best_effort, withdrawal_message},
    types::abbrev_uuid,
    validation::optional_text,
};

const MAX_REASON_CHARS: usize = 1000;

/// Record that the caller is leaving and tell operations.
#[utoipa::path(
    post,
    path = "/functions/v1/notify-withdrawal",
    tag = "members",
    summary = "Notify withdrawal",
    request_body = WithdrawalRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = Acknowledged),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn notify_withdrawal(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<WithdrawalRequest>,
) -> ApiResult<Acknowledged> {
    request_id.wrap(record(&state, &current_user, request).await)
}

async fn record(state: &AppState, current_user: &CurrentUser, request: WithdrawalRequest) -> Result<Acknowledged> {
    let reason = optional_text("reason", request.reason.as_deref(), MAX_REASON_CHARS)?;

    let log = state
        .store
        .create_withdrawal_log(&WithdrawalLogCreateDBRequest {
            user_id: current_user.id,
            email: current_user.email().map(str::to_string),
            reason,
        })
        .await?;

    info!(user_id = %abbrev_uuid(&log.user_id), "Withdrawal recorded");

    state.notifier.notify(withdrawal_message(&log));

    if state.email.admin_email().is_some() {
        let email = Arc::clone(&state.email);
        spawn_best_effort("email", async move { email.send_withdrawal_notice(&log).await });
    }

    Ok(Acknowledged {})
}
