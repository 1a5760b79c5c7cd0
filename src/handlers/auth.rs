use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::{ApiError, ApiState};

/// Identity behind an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Extractor that rejects requests without a live session with 401.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<ApiState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let session = state
            .repo
            .find_session(token)
            .map_err(|e| ApiError::internal("Failed to verify session", e))?
            .ok_or(ApiError::Unauthorized)?;

        Ok(RequireAuth(AuthUser {
            id: session.user_id,
            name: session.name,
            email: session.email,
        }))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
