//! HTTP surface: the `/functions/v1` endpoints, their models, and the response envelope.

pub mod envelope;
pub mod handlers;
pub mod models;
