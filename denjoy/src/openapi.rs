//! OpenAPI documentation for the edge functions under `/functions/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::{self, envelope::Acknowledged},
    errors::ErrorEnvelope,
    db::models::{inquiries::{InquiryStatus, InquiryType}, invite_codes::UsageMode, member_invitations::MemberRole},
};

/// Bearer access tokens issued by the auth platform.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token of a signed-in user:\n\n```\nAuthorization: Bearer ACCESS_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DenJOY edge functions",
        description = "Every response is a JSON envelope carrying `success` and `request_id`. \
                       Failures add `error_code` and `error`.",
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::contact::submit_contact,
        api::handlers::payments::payment_callback,
        api::handlers::inquiries::list_inquiries,
        api::handlers::inquiries::update_inquiry_status,
        api::handlers::inquiries::reply_inquiry,
        api::handlers::invite_codes::create_invite_code,
        api::handlers::invite_codes::list_invite_codes,
        api::handlers::invite_codes::toggle_invite_code,
        api::handlers::invite_codes::verify_invite_code,
        api::handlers::invite_codes::consume_invite_code,
        api::handlers::members::invite_member,
        api::handlers::reports::send_analysis_report,
        api::handlers::withdrawals::notify_withdrawal,
    ),
    components(schemas(
        Acknowledged,
        ErrorEnvelope,
        InquiryStatus,
        InquiryType,
        UsageMode,
        MemberRole,
        api::models::contact::ContactSubmission,
        api::models::contact::ContactSubmitted,
        api::models::payments::PaymentCallbackResponse,
        api::models::inquiries::InquiryStatusUpdate,
        api::models::inquiries::InquiryReplyRequest,
        api::models::inquiries::InquiryResponse,
        api::models::inquiries::InquiryEnvelope,
        api::models::inquiries::InquiryList,
        api::models::invite_codes::InviteCodeCreate,
        api::models::invite_codes::InviteCodeToggle,
        api::models::invite_codes::InviteCodeInput,
        api::models::invite_codes::InviteCodeResponse,
        api::models::invite_codes::InviteCodeEnvelope,
        api::models::invite_codes::InviteCodeList,
        api::models::invite_codes::InviteCodeVerifyResponse,
        api::models::invite_codes::InviteCodeConsumed,
        api::models::members::MemberInviteRequest,
        api::models::members::MemberInvited,
        api::models::reports::AnalysisReportRequest,
        api::models::reports::AnalysisReportSent,
        api::models::withdrawals::WithdrawalRequest,
    )),
    tags(
        (name = "contact", description = "Contact and waitlist intake"),
        (name = "payments", description = "Payment gateway callbacks"),
        (name = "inquiries", description = "Inquiry administration"),
        (name = "invite_codes", description = "Beta invite codes"),
        (name = "members", description = "Hospital members and account withdrawal"),
        (name = "reports", description = "Inventory analysis reports"),
    )
)]
pub struct ApiDoc;
