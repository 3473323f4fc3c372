//! HTTP response bodies

use serde::{Deserialize, Serialize};

use crate::BannerId;

/// Returned after a banner is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub banner_id: BannerId,
}

/// Error body returned by every failing endpoint that has something to say
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
