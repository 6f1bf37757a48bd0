//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (db::store - the seam handlers depend on)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries and procedure calls)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │  (tables + stored procedures from ./migrations)
//! └─────────────┘
//! ```
//!
//! Business invariants such as "a pending billing row transitions once" live in the stored
//! procedures; the Rust side only calls them and interprets the boolean they return.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;

pub use store::{PostgresStore, Store};
