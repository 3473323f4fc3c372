//! Banner Types - Pure type definitions
//!
//! This crate contains only plain data types shared by the core and the
//! server, with no async runtime dependencies.

pub mod banner;
pub mod response;

pub use banner::*;
pub use response::*;

use serde::{Deserialize, Serialize};

/// Caller role, established by the auth layer before a handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Privileged callers can see inactive banners
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
