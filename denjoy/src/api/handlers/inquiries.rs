//! HTTP handlers for inquiry administration.

use axum::extract::State;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        envelope::{ApiJson, ApiPath, ApiQuery, ApiResult, RequestId},
        models::inquiries::{InquiryEnvelope, InquiryList, InquiryReplyRequest, InquiryStatusUpdate, ListInquiriesQuery},
    },
    auth::{current_user::CurrentUser, permissions},
    db::{
        errors::DbError,
        models::inquiries::{InquiryFilter, InquiryReply, InquiryStatus, InquiryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{InquiryId, Operation, Resource, abbrev_uuid},
    validation::bounded_text,
};

const MAX_REPLY_CHARS: usize = 10_000;

fn inquiry_not_found(id: InquiryId) -> Error {
    Error::NotFound {
        resource: "Inquiry".to_string(),
        id: id.to_string(),
    }
}

/// List inquiries, newest first.
#[utoipa::path(
    get,
    path = "/functions/v1/inquiries",
    tag = "inquiries",
    summary = "List inquiries",
    params(ListInquiriesQuery),
    responses(
        (status = 200, description = "Page of inquiries", body = InquiryList),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_inquiries(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiQuery(query): ApiQuery<ListInquiriesQuery>,
) -> ApiResult<InquiryList> {
    request_id.wrap(list(&state, &current_user, query).await)
}

async fn list(state: &AppState, current_user: &CurrentUser, query: ListInquiriesQuery) -> Result<InquiryList> {
    permissions::require_platform_admin(current_user, Operation::Read, Resource::Inquiries)?;

    let (limit, offset) = (query.limit(), query.offset());
    let mut filter = InquiryFilter::new(offset, limit);
    if let Some(status) = query.status {
        filter = filter.with_status(status);
    }

    let inquiries = state.store.list_inquiries(&filter).await?;

    Ok(InquiryList {
        inquiries: inquiries.into_iter().map(Into::into).collect(),
        limit,
        offset,
    })
}

/// Move an inquiry to another status.
#[utoipa::path(
    patch,
    path = "/functions/v1/inquiries/{id}",
    tag = "inquiries",
    summary = "Update inquiry status",
    params(("id" = uuid::Uuid, Path, description = "Inquiry ID")),
    request_body = InquiryStatusUpdate,
    responses(
        (status = 200, description = "Updated inquiry", body = InquiryEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Inquiry not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_inquiry_status(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiPath(id): ApiPath<InquiryId>,
    ApiJson(update): ApiJson<InquiryStatusUpdate>,
) -> ApiResult<InquiryEnvelope> {
    request_id.wrap(update_status(&state, &current_user, id, update.status).await)
}

async fn update_status(state: &AppState, current_user: &CurrentUser, id: InquiryId, status: InquiryStatus) -> Result<InquiryEnvelope> {
    permissions::require_platform_admin(current_user, Operation::Update, Resource::Inquiries)?;

    let request = InquiryUpdateDBRequest {
        status: Some(status),
        ..Default::default()
    };
    let inquiry = match state.store.update_inquiry(id, &request).await {
        Ok(inquiry) => inquiry,
        Err(DbError::NotFound) => return Err(inquiry_not_found(id)),
        Err(e) => return Err(e.into()),
    };

    Ok(InquiryEnvelope { inquiry: inquiry.into() })
}

/// Email a reply to the inquirer and resolve the inquiry.
#[utoipa::path(
    post,
    path = "/functions/v1/reply-inquiry",
    tag = "inquiries",
    summary = "Reply to inquiry",
    request_body = InquiryReplyRequest,
    responses(
        (status = 200, description = "Reply sent and inquiry resolved", body = InquiryEnvelope),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Inquiry not found"),
        (status = 500, description = "Email delivery or database failure"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn reply_inquiry(
    State(state): State<AppState>,
    request_id: RequestId,
    current_user: CurrentUser,
    ApiJson(request): ApiJson<InquiryReplyRequest>,
) -> ApiResult<InquiryEnvelope> {
    request_id.wrap(reply(&state, &current_user, request).await)
}

async fn reply(state: &AppState, current_user: &CurrentUser, request: InquiryReplyRequest) -> Result<InquiryEnvelope> {
    permissions::require_platform_admin(current_user, Operation::Reply, Resource::Inquiries)?;

    let message = bounded_text("reply_message", &request.reply_message, 1, MAX_REPLY_CHARS)?;
    let inquiry = state
        .store
        .get_inquiry(request.inquiry_id)
        .await?
        .ok_or_else(|| inquiry_not_found(request.inquiry_id))?;

    state.email.send_inquiry_reply(&inquiry, &message).await?;

    let update = InquiryUpdateDBRequest {
        status: Some(InquiryStatus::Resolved),
        reply: Some(InquiryReply {
            message,
            replied_by: current_user.id,
        }),
    };
    let inquiry = state.store.update_inquiry(inquiry.id, &update).await?;

    info!(inquiry_id = %abbrev_uuid(&inquiry.id), "Inquiry answered");

    Ok(InquiryEnvelope { inquiry: inquiry.into() })
}
