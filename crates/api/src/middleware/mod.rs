//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthUser`] -- Resolves the user behind a JWT Bearer token.

pub mod auth;
