//! Database models for analysis-report leads.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::LeadId;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisLead {
    pub id: LeadId,
    pub email: String,
    pub hospital_name: Option<String>,
    pub score: Option<i32>,
    pub report_text: String,
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}

/// Request for recording a lead
#[derive(Debug, Clone)]
pub struct AnalysisLeadCreateDBRequest {
    pub email: String,
    pub hospital_name: Option<String>,
    pub score: Option<i32>,
    pub report_text: String,
    pub consent: bool,
}
