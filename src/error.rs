//! HTTP error boundary: every failure a handler can return, mapped to a
//! status code and a stable `code` string inside [`ErrorResponse`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::backend::StoreError;
use crate::schemas::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("Missing API key")]
    MissingApiKey,
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("{0}")]
    CallbackFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(err) => match err {
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::NotAuthenticated
                | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
                AuthError::EmailNotConfirmed => StatusCode::FORBIDDEN,
                AuthError::EmailAlreadyRegistered => StatusCode::CONFLICT,
                AuthError::WeakPassword | AuthError::InvalidCode => StatusCode::BAD_REQUEST,
                AuthError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Validation(_) | ApiError::CallbackFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey | ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Store(err) => match err {
                StoreError::NotFound(_) => "NOT_FOUND",
                StoreError::Conflict(_) => "CONFLICT",
                StoreError::InvalidReference(_) => "INVALID_REFERENCE",
                StoreError::Unavailable(_) => "BACKEND_UNAVAILABLE",
                StoreError::Database(_) => "BACKEND_ERROR",
            },
            ApiError::Auth(err) => match err {
                AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
                AuthError::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
                AuthError::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
                AuthError::WeakPassword => "WEAK_PASSWORD",
                AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
                AuthError::SessionExpired => "SESSION_EXPIRED",
                AuthError::InvalidCode => "INVALID_AUTH_CODE",
                AuthError::Backend(_) => "AUTH_BACKEND_ERROR",
            },
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::MissingApiKey => "MISSING_API_KEY",
            ApiError::InvalidApiKey => "INVALID_API_KEY",
            ApiError::CallbackFailed(_) => "AUTH_CALLBACK_ERROR",
        }
    }

    /// Message shown to the client. Backend internals stay in the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::Unavailable(_)) => {
                "The finance backend is unavailable".to_string()
            }
            ApiError::Store(StoreError::Database(_)) => {
                "Failed to reach the finance backend".to_string()
            }
            ApiError::Auth(AuthError::Backend(_)) => {
                "The authentication service is unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        } else {
            warn!("Request rejected with {}: {}", status, self.code());
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
