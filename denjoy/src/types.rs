//! Common type definitions and permission system types.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases:
//!
//! - [`UserId`]: Auth platform user identifier (also the `profiles` primary key)
//! - [`HospitalId`]: Tenant identifier
//! - [`BillingId`]: One payment/subscription transaction
//! - [`InquiryId`]: Contact inquiry row
//! - [`InviteCodeId`]: Beta invite code row
//!
//! # Permission System
//!
//! Authorization is role based. [`Resource`] names what is being touched and [`Operation`] what is
//! being done to it; both only exist to build readable `permission_denied` messages; the actual
//! rules live in [`crate::auth::permissions`].

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type HospitalId = Uuid;
pub type BillingId = Uuid;
pub type InquiryId = Uuid;
pub type InviteCodeId = Uuid;
pub type LeadId = Uuid;
pub type InvitationId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Reply,
    Invite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Inquiries,
    InviteCodes,
    Members,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Reply => write!(f, "reply to"),
            Operation::Invite => write!(f, "invite"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Inquiries => write!(f, "inquiries"),
            Resource::InviteCodes => write!(f, "beta invite codes"),
            Resource::Members => write!(f, "hospital members"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
