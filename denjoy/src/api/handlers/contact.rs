//! HTTP handler for contact and waitlist intake.

use axum::extract::State;
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    AppState,
    api::{
        envelope::{ApiJson, ApiResult, RequestId},
        models::contact::{ContactSubmission, ContactSubmitted},
    },
    crypto::submission_digest,
    db::models::inquiries::InquiryCreateDBRequest,
    errors::Result,
    notifications::inquiry_message,
    types::abbrev_uuid,
    validation::{bounded_text, optional_text, validate_email},
};

const MAX_NAME_CHARS: usize = 100;
const MIN_CONTENT_CHARS: usize = 10;
const MAX_CONTENT_CHARS: usize = 5000;
const MAX_PHONE_CHARS: usize = 30;
const MAX_HOSPITAL_CHARS: usize = 200;

/// Submit a contact or waitlist inquiry.
#[utoipa::path(
    post,
    path = "/functions/v1/submit-contact",
    tag = "contact",
    summary = "Submit contact inquiry",
    description = "Validate and store a contact or waitlist submission. The same email and message are accepted once per day.",
    request_body = ContactSubmission,
    responses(
        (status = 200, description = "Inquiry stored", body = ContactSubmitted),
        (status = 400, description = "Invalid input or email"),
        (status = 409, description = "Duplicate submission"),
        (status = 500, description = "Internal server error"),
    )
)]
#[instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<ContactSubmission>,
) -> ApiResult<ContactSubmitted> {
    request_id.wrap(submit(&state, request).await)
}

async fn submit(state: &AppState, request: ContactSubmission) -> Result<ContactSubmitted> {
    if request.website.as_deref().is_some_and(|w| !w.trim().is_empty()) {
        info!("Honeypot field filled in, discarding contact submission");
        return Ok(ContactSubmitted { inquiry_id: Uuid::new_v4() });
    }

    let name = bounded_text("name", &request.name, 1, MAX_NAME_CHARS)?;
    let email = validate_email(&request.email)?;
    let content = bounded_text("content", &request.content, MIN_CONTENT_CHARS, MAX_CONTENT_CHARS)?;
    let phone = optional_text("phone", request.phone.as_deref(), MAX_PHONE_CHARS)?;
    let hospital_name = optional_text("hospital_name", request.hospital_name.as_deref(), MAX_HOSPITAL_CHARS)?;

    let submission_digest = submission_digest(&email, &content, Utc::now().date_naive());

    let inquiry = state
        .store
        .create_inquiry(&InquiryCreateDBRequest {
            name,
            email,
            phone,
            hospital_name,
            inquiry_type: request.inquiry_type,
            content,
            submission_digest,
        })
        .await?;

    info!(
        inquiry_id = %abbrev_uuid(&inquiry.id),
        inquiry_type = inquiry.inquiry_type.label(),
        "Contact inquiry stored"
    );

    state.notifier.notify(inquiry_message(&inquiry));

    Ok(ContactSubmitted { inquiry_id: inquiry.id })
}
