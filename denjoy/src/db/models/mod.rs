//! Database record structures matching table schemas.

pub mod billing;
pub mod geo_access_logs;
pub mod inquiries;
pub mod invite_codes;
pub mod leads;
pub mod member_invitations;
pub mod profiles;
pub mod withdrawal_logs;
