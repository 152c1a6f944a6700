//! API error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The body is always an
//! [`ErrorBody`] so the client wrapper can read `message` (and look for the
//! token-error marker) without caring which endpoint failed.

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use models::{ErrorBody, TOKEN_ERROR_MARKER, TokenError};

use crate::services::accounts::{AccountError, Revocation};
use crate::services::password::PasswordError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The presented session token cannot be used. Always carries the marker.
    #[error("{TOKEN_ERROR_MARKER}: {0}")]
    Token(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),
    #[error("{0}")]
    Unavailable(&'static str),
    #[error("{0}")]
    BadGateway(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Single-field validation failure.
    #[must_use]
    pub fn field(name: &str, message: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_owned(), message.to_owned());
        Self::Validation(fields)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Token(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            Self::Validation(fields) => ErrorBody { message: "validation failed".to_owned(), fields },
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                ErrorBody::new("internal server error")
            }
            other => ErrorBody::new(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::Token(err.to_string())
    }
}

impl From<Revocation> for ApiError {
    fn from(revocation: Revocation) -> Self {
        Self::Token(revocation.reason().to_owned())
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => Self::field("email", "email already registered"),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
