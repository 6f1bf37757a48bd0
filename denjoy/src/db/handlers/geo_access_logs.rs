//! Database repository for geo-blocked requests.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{errors::Result, models::geo_access_logs::GeoAccessLogCreateDBRequest};

pub struct GeoAccessLogs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> GeoAccessLogs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(country = %request.country), err)]
    pub async fn create(&mut self, request: &GeoAccessLogCreateDBRequest) -> Result<()> {
        sqlx::query("INSERT INTO geo_access_logs (country, path, ip, user_agent) VALUES ($1, $2, $3, $4)")
            .bind(&request.country)
            .bind(&request.path)
            .bind(&request.ip)
            .bind(&request.user_agent)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }
}
