//! Token auth for protected routes
//!
//! Callers send a static token in the `token` header. The matching role is
//! attached to the request as an extension for handlers to read.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use banner_types::{ErrorResponse, Role};

pub const TOKEN_HEADER: &str = "token";

/// Static tokens accepted for each role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokens {
    pub user_token: String,
    pub admin_token: String,
}

impl Default for AccessTokens {
    fn default() -> Self {
        Self {
            user_token: "user_token".to_string(),
            admin_token: "admin_token".to_string(),
        }
    }
}

impl AccessTokens {
    pub fn role_for(&self, token: &str) -> Option<Role> {
        if token == self.admin_token {
            Some(Role::Admin)
        } else if token == self.user_token {
            Some(Role::User)
        } else {
            None
        }
    }
}

/// Auth error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl AuthError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized",
        }
    }

    fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

fn authenticate(state: &AppState, req: &Request, allowed: &[Role]) -> Result<Role, AuthError> {
    let token = req
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
        .ok_or_else(AuthError::unauthorized)?;

    match state.tokens.role_for(token) {
        Some(role) if allowed.contains(&role) => Ok(role),
        _ => {
            tracing::debug!(path = %req.uri().path(), "Rejected token");
            Err(AuthError::forbidden())
        }
    }
}

/// Lets users and admins through
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let role = authenticate(&state, &req, &[Role::User, Role::Admin])?;
    req.extensions_mut().insert(role);
    Ok(next.run(req).await)
}

/// Lets admins through
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let role = authenticate(&state, &req, &[Role::Admin])?;
    req.extensions_mut().insert(role);
    Ok(next.run(req).await)
}
