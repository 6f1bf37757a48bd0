//! API request model for account withdrawal notices.

use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WithdrawalRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
