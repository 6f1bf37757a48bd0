//! Database models for user profiles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{HospitalId, UserId};

/// Role stored on the profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    /// Platform operator
    Admin,
    /// Owner of a hospital workspace
    Master,
    /// Member of a hospital workspace
    Staff,
}

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub role: ProfileRole,
    pub hospital_id: Option<HospitalId>,
}
