//! Request authentication helpers.

use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
};

use crate::{domain::UserId, infrastructure::dto::http::ErrorResponseDto};

use super::state::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Caller authenticated with a Bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = (StatusCode, Json<ErrorResponseDto>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = |message: String| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponseDto { error: message }),
            )
        };

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| unauthorized("Authentication token is missing".to_string()))?;
        let user_id = state
            .token_verifier
            .verify(token)
            .map_err(|e| unauthorized(e.to_string()))?;

        Ok(AuthenticatedUser(user_id))
    }
}
