//! HTTP handler for payment gateway callbacks.

use axum::{
    extract::{RawQuery, State, rejection::BytesRejection},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use bytes::Bytes;
use tracing::instrument;

use crate::{
    AppState,
    api::{
        envelope::{ApiResult, RequestId},
        models::payments::PaymentCallbackResponse,
    },
    errors::Error,
    payments::{self, CallbackRequest},
};

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Receive a payment gateway notification.
#[utoipa::path(
    post,
    path = "/functions/v1/payment-callback",
    tag = "payments",
    summary = "Payment callback",
    description = "Accepts JSON, form, multipart or unlabeled bodies. The billing id, status and payment reference are \
                   found under any of their known aliases, and the shared secret is read from the `token` query \
                   parameter or the `x-callback-token` header.",
    params(
        ("token" = Option<String>, Query, description = "Shared callback secret"),
    ),
    request_body(
        content = String,
        content_type = "application/octet-stream",
        description = "JSON, form, multipart or unlabeled callback body"
    ),
    responses(
        (status = 200, description = "Payment outcome applied", body = PaymentCallbackResponse),
        (status = 400, description = "Missing or malformed fields, or an unrecognized status"),
        (status = 401, description = "Missing or wrong callback token"),
        (status = 409, description = "Billing record is not pending"),
        (status = 500, description = "Server misconfigured or database error"),
    )
)]
#[instrument(skip_all)]
pub async fn payment_callback(
    State(state): State<AppState>,
    request_id: RequestId,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<PaymentCallbackResponse> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            return request_id.wrap(Err(Error::InvalidInput {
                message: rejection.body_text(),
            }));
        }
    };

    let request = CallbackRequest {
        content_type: header_str(&headers, CONTENT_TYPE.as_str()),
        query: query.as_deref(),
        header_token: header_str(&headers, state.config.payment.token_header.as_str()),
        body,
    };

    let result = payments::process_callback(state.store.as_ref(), &state.config.payment, request)
        .await
        .map(PaymentCallbackResponse::from);

    request_id.wrap(result)
}
