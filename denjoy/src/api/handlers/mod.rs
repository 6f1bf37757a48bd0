//! Endpoint handlers, one module per edge function family.

pub mod contact;
pub mod inquiries;
pub mod invite_codes;
pub mod members;
pub mod payments;
pub mod reports;
pub mod withdrawals;
