//! Database models for contact inquiries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{InquiryId, UserId};

/// Inquiry handling state
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    Pending,
    InProgress,
    Resolved,
}

/// What the visitor is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    General,
    Demo,
    Pricing,
    Partnership,
    Waitlist,
    Other,
}

impl InquiryType {
    pub fn label(&self) -> &'static str {
        match self {
            InquiryType::General => "general",
            InquiryType::Demo => "demo",
            InquiryType::Pricing => "pricing",
            InquiryType::Partnership => "partnership",
            InquiryType::Waitlist => "waitlist",
            InquiryType::Other => "other",
        }
    }
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hospital_name: Option<String>,
    pub inquiry_type: InquiryType,
    pub content: String,
    pub status: InquiryStatus,
    pub submission_digest: String,
    pub admin_reply: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub replied_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating an inquiry
#[derive(Debug, Clone)]
pub struct InquiryCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub hospital_name: Option<String>,
    pub inquiry_type: InquiryType,
    pub content: String,
    pub submission_digest: String,
}

/// Admin reply recorded on an inquiry
#[derive(Debug, Clone)]
pub struct InquiryReply {
    pub message: String,
    pub replied_by: UserId,
}

/// Request for updating an inquiry. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct InquiryUpdateDBRequest {
    pub status: Option<InquiryStatus>,
    pub reply: Option<InquiryReply>,
}

/// Filter for listing inquiries
#[derive(Debug, Clone)]
pub struct InquiryFilter {
    pub status: Option<InquiryStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl InquiryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { status: None, skip, limit }
    }

    pub fn with_status(mut self, status: InquiryStatus) -> Self {
        self.status = Some(status);
        self
    }
}
