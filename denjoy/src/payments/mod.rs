//! Payment gateway callback processing.
//!
//! A callback is authenticated against the shared secret, decoded into a [`FieldMap`],
//! normalized into `(billing_id, status, payment_ref)`, and handed to the
//! `process_payment_callback` procedure which owns the billing state machine.

pub mod decode;
pub mod normalizer;

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::PaymentConfig,
    crypto::timing_safe_eq,
    db::Store,
    errors::Error,
    types::abbrev_uuid,
};

pub use normalizer::{FieldMap, NormalizedCallback, classify_status, normalize};

/// Raw pieces of an inbound callback request
#[derive(Debug, Clone)]
pub struct CallbackRequest<'a> {
    pub content_type: Option<&'a str>,
    pub query: Option<&'a str>,
    pub header_token: Option<&'a str>,
    pub body: Bytes,
}

fn query_token(query: Option<&str>, param: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
}

/// Check the shared secret. Without a configured secret callbacks are refused unless the
/// deployment explicitly opted into unauthenticated callbacks.
pub fn authenticate(config: &PaymentConfig, query: Option<&str>, header_token: Option<&str>) -> Result<(), Error> {
    let Some(secret) = config.callback_secret.as_deref() else {
        if config.allow_unauthenticated_callbacks {
            warn!("Accepting payment callback without authentication: payment.callback_secret is not set");
            return Ok(());
        }
        return Err(Error::ServerMisconfigured {
            setting: "payment.callback_secret".to_string(),
        });
    };

    let presented = query_token(query, &config.token_query_param).or_else(|| header_token.map(str::to_string));

    match presented {
        Some(token) if timing_safe_eq(token.as_bytes(), secret.as_bytes()) => Ok(()),
        Some(_) => Err(Error::Unauthenticated {
            message: Some("Invalid callback token".to_string()),
        }),
        None => Err(Error::Unauthenticated {
            message: Some("Missing callback token".to_string()),
        }),
    }
}

fn outcome_label(result: &Result<NormalizedCallback, Error>) -> &'static str {
    match result {
        Ok(_) => "applied",
        Err(Error::Conflict { .. }) => "rejected",
        Err(Error::Unauthenticated { .. }) => "unauthorized",
        Err(Error::ServerMisconfigured { .. }) => "misconfigured",
        Err(Error::InvalidJson { .. } | Error::InvalidInput { .. } | Error::UnrecognizedStatus { .. }) => "invalid",
        Err(_) => "error",
    }
}

/// Authenticate, decode, normalize and apply one callback.
#[instrument(skip_all, err)]
pub async fn process_callback(store: &dyn Store, config: &PaymentConfig, request: CallbackRequest<'_>) -> Result<NormalizedCallback, Error> {
    let result = apply_callback(store, config, request).await;
    metrics::counter!("denjoy_payment_callbacks_total", "outcome" => outcome_label(&result)).increment(1);
    result
}

async fn apply_callback(store: &dyn Store, config: &PaymentConfig, request: CallbackRequest<'_>) -> Result<NormalizedCallback, Error> {
    authenticate(config, request.query, request.header_token)?;

    let fields = decode::collect_fields(request.content_type, request.body, request.query).await?;
    debug!(field_count = fields.len(), "Decoded callback fields");
    let callback = normalize(&fields, chrono::Utc::now().timestamp_millis())?;

    let applied = store
        .process_payment_callback(callback.billing_id, callback.status, &callback.payment_ref)
        .await?;

    if !applied {
        return Err(Error::Conflict {
            message: "Billing record is not pending or does not exist".to_string(),
        });
    }

    info!(
        billing_id = %abbrev_uuid(&callback.billing_id),
        status = %callback.status,
        "Payment callback applied"
    );

    Ok(callback)
}
