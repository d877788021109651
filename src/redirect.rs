//! Landing point after an email link: `GET /auth/callback`.
//!
//! What happens depends on the query string alone, see [`decide`].

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use utoipa::IntoParams;

use crate::auth::{AuthError, session_cookie};
use crate::error::ApiError;
use crate::schemas::AppState;

pub const DEFAULT_NEXT: &str = "/dashboard";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CallbackQuery {
    /// One-time code from the email link
    pub code: Option<String>,
    /// Local path to continue to after signing in
    pub next: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackDecision {
    /// The link carried an error
    Failed { description: String },
    /// Trade the code for a session, then go to `next`
    Exchange { code: String, next: String },
    /// Nothing usable in the query
    Missing,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Only local absolute paths are followed; anything else falls back to
/// [`DEFAULT_NEXT`].
pub fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        Some(rejected) => {
            warn!("Ignoring non-local redirect target {:?}", rejected);
            DEFAULT_NEXT.to_string()
        }
        None => DEFAULT_NEXT.to_string(),
    }
}

pub fn decide(query: &CallbackQuery) -> CallbackDecision {
    if let Some(error) = non_empty(&query.error) {
        let description = non_empty(&query.error_description).unwrap_or(error);
        return CallbackDecision::Failed {
            description: description.to_string(),
        };
    }
    if let Some(description) = non_empty(&query.error_description) {
        return CallbackDecision::Failed {
            description: description.to_string(),
        };
    }
    match non_empty(&query.code) {
        Some(code) => CallbackDecision::Exchange {
            code: code.to_string(),
            next: sanitize_next(non_empty(&query.next)),
        },
        None => CallbackDecision::Missing,
    }
}

/// Exchange an emailed code for a session and redirect
#[utoipa::path(
    get,
    path = "/auth/callback",
    tag = "auth",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Signed in, redirecting to the next page"),
        (status = 400, description = "The link carried an error or no usable code", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, query))]
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    match decide(&query) {
        CallbackDecision::Failed { description } => {
            warn!("Auth callback reported an error: {}", description);
            Err(ApiError::CallbackFailed(description))
        }
        CallbackDecision::Missing => {
            debug!("Auth callback without a code");
            Err(AuthError::InvalidCode.into())
        }
        CallbackDecision::Exchange { code, next } => {
            let session = state.auth.exchange_code_for_session(&code).await?;
            info!("User {} signed in through the callback", session.user.id);
            let cookie = session_cookie(&session.token)?;
            let mut response = Redirect::to(&next).into_response();
            response.headers_mut().insert(SET_COOKIE, cookie);
            Ok(response)
        }
    }
}
