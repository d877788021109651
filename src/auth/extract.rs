//! Request-side auth: the API key gate and the session extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, trace, warn};

use super::{AuthError, AuthUser};
use crate::error::ApiError;
use crate::schemas::AppState;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "fc_session";
/// Header carrying the anonymous API key.
pub const API_KEY_HEADER: &str = "apikey";

/// `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/",
        SESSION_COOKIE, token
    ))
    .map_err(|_| ApiError::Auth(AuthError::Backend("unencodable session token".to_string())))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("fc_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Finds the session token in `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Rejects requests without the configured API key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .ok_or(ApiError::MissingApiKey)?;
    if presented.as_bytes() != state.settings.anon_key.as_bytes() {
        warn!("Rejected request to {} with a wrong API key", request.uri().path());
        return Err(ApiError::InvalidApiKey);
    }
    trace!("API key accepted");
    Ok(next.run(request).await)
}

/// The user behind the request's session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub token: String,
}

impl AppState {
    /// Resolves a token through the session cache, falling back to the
    /// auth provider on a miss or a stale entry.
    pub async fn resolve_session(&self, token: &str) -> Result<AuthUser, AuthError> {
        if let Some(user) = self.sessions.get(token).await {
            if user.expires_at > Utc::now() {
                trace!("Session cache hit for user {}", user.id);
                return Ok(user);
            }
            self.sessions.invalidate(token).await;
        }

        let user = self.auth.resolve_session(token).await?;
        self.sessions.insert(token.to_string(), user.clone()).await;
        debug!("Cached session of user {}", user.id);
        Ok(user)
    }

    pub async fn forget_session(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }

    /// Drops every cached session of `user_id`.
    pub fn forget_user_sessions(&self, user_id: uuid::Uuid) {
        if let Err(e) = self
            .sessions
            .invalidate_entries_if(move |_, user| user.id == user_id)
        {
            warn!("Failed to invalidate cached sessions: {}", e);
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::NotAuthenticated)?;
        let user = state.resolve_session(&token).await?;
        Ok(CurrentUser { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert(COOKIE, HeaderValue::from_static("fc_session=cookie-token"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; fc_session=cookie-token; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(COOKIE, HeaderValue::from_static("fc_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok").unwrap();
        assert_eq!(cookie.to_str().unwrap(), "fc_session=tok; HttpOnly; SameSite=Lax; Path=/");
    }
}
