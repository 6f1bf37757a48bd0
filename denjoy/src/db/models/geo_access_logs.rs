//! Database models for blocked-request audit rows.

/// Request for recording a geo-blocked request
#[derive(Debug, Clone)]
pub struct GeoAccessLogCreateDBRequest {
    pub country: String,
    pub path: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
