//! Error types surfaced to API clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::store::StoreError;

/// Input rejected before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown project year: {0}")]
    UnknownYear(String),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} exceeds the largest supported amount")]
    TooLarge(&'static str),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::PermissionDenied(_)) | Self::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(StoreError::Database(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        // Don't expose database details to clients
        let message = match &self {
            Self::Store(StoreError::Database(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("P0003".to_string());
        assert_eq!(err.to_string(), "Not found: P0003");

        let err = AppError::from(ValidationError::DuplicateEmail("a@b.co".to_string()));
        assert_eq!(err.to_string(), "Validation failed: Email already exists: a@b.co");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(status(AppError::Unauthorized("no token".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Forbidden("admin only".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status(ValidationError::Negative("amount").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(StoreError::NotFound(Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StoreError::PermissionDenied("rules".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
