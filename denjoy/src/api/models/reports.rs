//! API request and response models for analysis report emails.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::LeadId;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnalysisReportRequest {
    pub email: String,
    #[serde(default)]
    pub hospital_name: Option<String>,
    /// Plain-text report as produced by the analysis tool
    pub report_text: String,
    /// Marketing consent; the report is only sent when true
    #[serde(default)]
    pub consent: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisReportSent {
    #[schema(value_type = String, format = "uuid")]
    pub lead_id: LeadId,
    /// Score parsed from the report, if present
    pub score: Option<u32>,
}
