use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients. Upstream failures are absorbed by the
/// adapters and only reach this type as `Unavailable`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    /// Rejected query string; rendered as `{"error": ..}`.
    #[error("{0}")]
    BadQuery(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Trimmed, non-empty value or `"<field> is required"`.
pub fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

impl AppError {
    pub fn invalid_token() -> Self {
        AppError::Unauthorized("Invalid token".into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadQuery(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::BadQuery(msg) => json!({ "error": msg }),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::invalid_token().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn required_trims_and_names_the_field() {
        assert_eq!(required(Some("  bob ".into()), "username").unwrap(), "bob");
        let err = required(Some("   ".into()), "title").unwrap_err();
        assert_eq!(err.to_string(), "title is required");
        let err = required(None, "email").unwrap_err();
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = AppError::Internal(anyhow::anyhow!("connection reset by peer"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
