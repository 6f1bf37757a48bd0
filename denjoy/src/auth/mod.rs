//! Authentication and authorization.
//!
//! Users sign in through the hosted auth platform, which issues HS256 access tokens with
//! `aud = "authenticated"` and the user id in `sub`. Handlers take a [`current_user::CurrentUser`]
//! extractor, which verifies the `Authorization: Bearer` token and loads the caller's `profiles`
//! row. Role checks live in [`permissions`].
//!
//! # Modules
//!
//! - [`session`]: access token verification
//! - [`current_user`]: the request extractor
//! - [`permissions`]: role checks for admin and hospital-manager operations

pub mod current_user;
pub mod permissions;
pub mod session;
