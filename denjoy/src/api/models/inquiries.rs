//! API request and response models for inquiry administration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::models::inquiries::{Inquiry, InquiryStatus, InquiryType},
    types::{InquiryId, UserId},
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

/// Query parameters for listing inquiries
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInquiriesQuery {
    /// Only inquiries in this status
    pub status: Option<InquiryStatus>,
    /// Page size (default 50, at most 200)
    pub limit: Option<i64>,
    /// Number of inquiries to skip
    pub offset: Option<i64>,
}

impl ListInquiriesQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InquiryStatusUpdate {
    pub status: InquiryStatus,
}

/// Reply to an inquiry by email.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InquiryReplyRequest {
    #[schema(value_type = String, format = "uuid")]
    pub inquiry_id: InquiryId,
    pub reply_message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InquiryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    pub inquiry_type: InquiryType,
    pub content: String,
    pub status: InquiryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub replied_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Inquiry> for InquiryResponse {
    fn from(inquiry: Inquiry) -> Self {
        Self {
            id: inquiry.id,
            name: inquiry.name,
            email: inquiry.email,
            phone: inquiry.phone,
            hospital_name: inquiry.hospital_name,
            inquiry_type: inquiry.inquiry_type,
            content: inquiry.content,
            status: inquiry.status,
            admin_reply: inquiry.admin_reply,
            replied_at: inquiry.replied_at,
            replied_by: inquiry.replied_by,
            created_at: inquiry.created_at,
            updated_at: inquiry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InquiryEnvelope {
    pub inquiry: InquiryResponse,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InquiryList {
    pub inquiries: Vec<InquiryResponse>,
    pub limit: i64,
    pub offset: i64,
}
