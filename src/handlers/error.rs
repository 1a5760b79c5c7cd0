use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

/// Errors surfaced as HTTP error statuses. Expected git outcomes (not a
/// repository, failed push) are not errors here; they travel inside the
/// 200 payload.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{error}: {details}")]
    Internal {
        error: &'static str,
        details: String,
    },
}

impl ApiError {
    pub fn internal(error: &'static str, details: impl Display) -> Self {
        ApiError::Internal {
            error,
            details: details.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response(),
            ApiError::Internal { error, details } => {
                error!("{}: {}", error, details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error, "details": details })),
                )
                    .into_response()
            }
        }
    }
}
