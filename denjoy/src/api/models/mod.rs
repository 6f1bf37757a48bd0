//! API request and response models.

pub mod contact;
pub mod inquiries;
pub mod invite_codes;
pub mod members;
pub mod payments;
pub mod reports;
pub mod withdrawals;
