//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (pooled connection or open transaction) and
//! returns models from [`crate::db::models`]. The CRUD-shaped tables implement [`Repository`];
//! the append-only logs and procedure wrappers expose plain methods.
//!
//! - [`Inquiries`]: Contact and waitlist submissions
//! - [`InviteCodes`]: Beta invite codes and their verify/consume procedures
//! - [`Billing`]: The payment callback state transition
//! - [`AnalysisLeads`]: Leads captured by the analysis report
//! - [`Profiles`]: Role and hospital lookups for authenticated callers
//! - [`MemberInvitations`]: Hospital member invitations
//! - [`WithdrawalLogs`], [`GeoAccessLogs`]: Append-only audit rows

pub mod billing;
pub mod geo_access_logs;
pub mod inquiries;
pub mod invite_codes;
pub mod leads;
pub mod member_invitations;
pub mod profiles;
pub mod repository;
pub mod withdrawal_logs;

pub use billing::Billing;
pub use geo_access_logs::GeoAccessLogs;
pub use inquiries::Inquiries;
pub use invite_codes::InviteCodes;
pub use leads::AnalysisLeads;
pub use member_invitations::MemberInvitations;
pub use profiles::Profiles;
pub use repository::Repository;
pub use withdrawal_logs::WithdrawalLogs;
