//! Database repository for account withdrawals.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::withdrawal_logs::{WithdrawalLog, WithdrawalLogCreateDBRequest},
    },
    types::abbrev_uuid,
};

pub struct WithdrawalLogs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> WithdrawalLogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &WithdrawalLogCreateDBRequest) -> Result<WithdrawalLog> {
        let log = sqlx::query_as::<_, WithdrawalLog>(
            "INSERT INTO withdrawal_logs (user_id, email, reason) VALUES ($1, $2, $3) \
             RETURNING id, user_id, email, reason, created_at",
        )
        .bind(request.user_id)
        .bind(&request.email)
        .bind(&request.reason)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(log)
    }
}
