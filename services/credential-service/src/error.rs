//! HTTP-facing error type
//!
//! Every failure leaves the service as
//! `{"error":{"type":"...","message":"...","request_id":"req_..."}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad username/password at login
    #[error("invalid username or password")]
    Unauthorized,

    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Missing, malformed, expired or forged access token
    #[error("invalid access token: {0}")]
    InvalidCredential(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidRefreshToken | Self::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::InvalidCredential(_) => "invalid_token",
            Self::BadRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<credential_manager::Error> for ApiError {
    fn from(err: credential_manager::Error) -> Self {
        match err {
            credential_manager::Error::InvalidRefreshToken => Self::InvalidRefreshToken,
            credential_manager::Error::InvalidCredential(msg) => Self::InvalidCredential(msg),
            credential_manager::Error::Signing(msg) => Self::Internal(msg),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        if let Self::Internal(ref detail) = self {
            // Detail stays in the log, never in the body
            error!(request_id, error = %detail, "request failed");
        }

        let body = serde_json::json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
                "request_id": request_id,
            }
        });
        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
