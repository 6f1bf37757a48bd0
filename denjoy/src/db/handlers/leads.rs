//! Database repository for analysis-report leads.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::{
    errors::Result,
    models::leads::{AnalysisLead, AnalysisLeadCreateDBRequest},
};

pub struct AnalysisLeads<'c> {
    db: &'c mut PgConnection,
}

impl<'c> AnalysisLeads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(score = ?request.score), err)]
    pub async fn create(&mut self, request: &AnalysisLeadCreateDBRequest) -> Result<AnalysisLead> {
        let lead = sqlx::query_as::<_, AnalysisLead>(
            "INSERT INTO analysis_leads (email, hospital_name, score, report_text, consent) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, email, hospital_name, score, report_text, consent, created_at",
        )
        .bind(&request.email)
        .bind(&request.hospital_name)
        .bind(request.score)
        .bind(&request.report_text)
        .bind(request.consent)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(lead)
    }
}
