use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::{generate, Envelope};

/// Every failure a route can produce. Rendered as an error envelope whose
/// `status` is also the HTTP status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0:#}")]
    Database(anyhow::Error),
    #[error("{0:#}")]
    Mail(anyhow::Error),
    #[error("{0:#}")]
    Session(anyhow::Error),
    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Authentication(_)
            | ApiError::Database(_)
            | ApiError::Mail(_)
            | ApiError::Session(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> Envelope<()> {
        // Message is the underlying error text, raw database errors included.
        generate(true, self.to_string(), self.status(), None)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Database(e) | ApiError::Mail(e) | ApiError::Session(e) | ApiError::Internal(e) => {
                error!(error = ?e, %status, "request failed");
            }
            other => warn!(error = %other, %status, "request rejected"),
        }
        (status, Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_error_kind() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Authentication("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Mail(anyhow::anyhow!("smtp down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn envelope_carries_underlying_message() {
        let env = ApiError::Database(anyhow::anyhow!("duplicate key value")).envelope();
        assert!(env.error);
        assert_eq!(env.status, 500);
        assert_eq!(env.message, "duplicate key value");
        assert!(env.data.is_none());
    }
}
