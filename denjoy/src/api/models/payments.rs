//! API response models for payment callbacks.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{db::models::billing::PaymentStatus, payments::NormalizedCallback, types::BillingId};

/// The canonical triple that was applied.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentCallbackResponse {
    #[schema(value_type = String, format = "uuid")]
    pub billing_id: BillingId,
    pub status: PaymentStatus,
    pub payment_ref: String,
}

impl From<NormalizedCallback> for PaymentCallbackResponse {
    fn from(callback: NormalizedCallback) -> Self {
        Self {
            billing_id: callback.billing_id,
            status: callback.status,
            payment_ref: callback.payment_ref,
        }
    }
}
