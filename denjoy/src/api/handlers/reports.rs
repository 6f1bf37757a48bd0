//! HTTP handler for the inventory analysis report email.

use axum::extract::State;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        envelope::{ApiJson, ApiResult, RequestId},
        models::reports::{AnalysisReportRequest, AnalysisReportSent},
    },
    db::models::leads::AnalysisLeadCreateDBRequest,
    errors::{Error, Result},
    reports::parse_report,
    types::abbrev_uuid,
    validation::{bounded_text, optional_text, validate_email},
};

const MAX_HOSPITAL_CHARS: usize = 200;
const MAX_REPORT_CHARS: usize = 50_000;

/// Email a formatted analysis report and record the lead.
#[utoipa::path(
    post,
    path = "/functions/v1/send-analysis-report",
    tag = "reports",
    summary = "Send analysis report",
    description = "Parses the plain-text report, stores the lead, and emails the rendered report.",
    request_body = AnalysisReportRequest,
    responses(
        (status = 200, description = "Report sent", body = AnalysisReportSent),
        (status = 400, description = "Missing consent, invalid email or empty report"),
        (status = 500, description = "Email delivery or database failure"),
    )
)]
#[instrument(skip_all)]
pub async fn send_analysis_report(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(request): ApiJson<AnalysisReportRequest>,
) -> ApiResult<AnalysisReportSent> {
    request_id.wrap(send(&state, request).await)
}

async fn send(state: &AppState, request: AnalysisReportRequest) -> Result<AnalysisReportSent> {
    if !request.consent {
        return Err(Error::InvalidInput {
            message: "Consent is required to receive the report".to_string(),
        });
    }

    let email = validate_email(&request.email)?;
    let hospital_name = optional_text("hospital_name", request.hospital_name.as_deref(), MAX_HOSPITAL_CHARS)?;
    let report_text = bounded_text("report_text", &request.report_text, 1, MAX_REPORT_CHARS)?;

    let report = parse_report(&report_text);
    let score = report.score.as_ref().map(|s| s.value);

    let lead = state
        .store
        .create_analysis_lead(&AnalysisLeadCreateDBRequest {
            email: email.clone(),
            hospital_name: hospital_name.clone(),
            score: score.and_then(|s| i32::try_from(s).ok()),
            report_text,
            consent: request.consent,
        })
        .await?;

    state
        .email
        .send_analysis_report(&email, hospital_name.as_deref(), &report)
        .await?;

    info!(lead_id = %abbrev_uuid(&lead.id), score, "Analysis report sent");

    Ok(AnalysisReportSent { lead_id: lead.id, score })
}
