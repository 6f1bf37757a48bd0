//! Database access for billing state transitions.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{errors::Result, models::billing::PaymentStatus},
    types::{BillingId, abbrev_uuid},
};

pub struct Billing<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Billing<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Run `process_payment_callback`. False means the row is unknown or no longer pending.
    #[instrument(skip(self, payment_ref), fields(billing_id = %abbrev_uuid(&billing_id), status = %status), err)]
    pub async fn process_callback(&mut self, billing_id: BillingId, status: PaymentStatus, payment_ref: &str) -> Result<bool> {
        let applied: bool = sqlx::query_scalar("SELECT process_payment_callback($1, $2, $3)")
            .bind(billing_id)
            .bind(status.as_str())
            .bind(payment_ref)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(applied)
    }
}
