//! HTTP handlers

pub mod banners;
pub mod health;
pub mod params;
pub mod user_banner;


pub use health::{health, index};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use banner_core::BannerError;
use banner_types::ErrorResponse;

/// Handler error. Errors without a message are sent with an empty body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: Some(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: Some(message.into()),
        }
    }
}

impl From<BannerError> for ApiError {
    fn from(e: BannerError) -> Self {
        match e {
            BannerError::RecordAbsent => Self::not_found(),
            e => {
                tracing::error!("Request failed: {}", e);
                Self::internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (self.status, Json(ErrorResponse::new(message))).into_response(),
            None => self.status.into_response(),
        }
    }
}
