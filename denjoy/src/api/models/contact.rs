//! API request and response models for contact and waitlist intake.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{db::models::inquiries::InquiryType, types::InquiryId};

/// Contact or waitlist form submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContactSubmission {
    /// 1-100 characters
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub hospital_name: Option<String>,
    pub inquiry_type: InquiryType,
    /// 10-5000 characters
    pub content: String,
    /// Honeypot field. Humans never fill it in.
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContactSubmitted {
    #[schema(value_type = String, format = "uuid")]
    pub inquiry_id: InquiryId,
}
