//! Request extractors and guards

pub mod auth;

pub use auth::{require_admin, require_user, AccessTokens};
