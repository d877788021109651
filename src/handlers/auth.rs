use std::fmt;

use crate::auth::{AuthError, CurrentUser, clear_session_cookie, session_cookie, session_token};
use crate::error::ApiResult;
use crate::helpers::converters::{session_dto, user_dto};
use crate::helpers::validate_not_blank;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use axum_valid::Valid;
use common::{SessionDto, SessionInfoDto, SignUpResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Email and password
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    /// At least 6 characters when signing up
    pub password: String,
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct EmailRequest {
    #[validate(email)]
    pub email: String,
}

/// Code from the password reset email and the new password
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub code: String,
    pub password: String,
}

impl fmt::Debug for ResetPasswordRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordRequest")
            .field("code", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created; a session is returned unless email confirmation is required", body = ApiResponse<SignUpResponse>),
        (status = 400, description = "Invalid email or weak password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CredentialsRequest>>,
) -> ApiResult<Response> {
    trace!("Entering sign_up function");

    let outcome = state.auth.sign_up(&request.email, &request.password).await?;
    info!("User {} signed up", outcome.user.id);

    let cookie = outcome
        .session
        .as_ref()
        .map(|session| session_cookie(&session.token))
        .transpose()?;
    let confirmation_required = outcome.session.is_none();
    let body = ApiResponse::ok(
        SignUpResponse {
            user: user_dto(outcome.user),
            session: outcome.session.map(session_dto),
            confirmation_required,
        },
        if confirmation_required {
            "Check your email to confirm the account"
        } else {
            "Account created successfully"
        },
    );

    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SessionDto>),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Email not confirmed", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CredentialsRequest>>,
) -> ApiResult<Response> {
    trace!("Entering login function");

    let session = state
        .auth
        .sign_in_with_password(&request.email, &request.password)
        .await?;
    info!("User {} logged in", session.user.id);

    let cookie = session_cookie(&session.token)?;
    let mut response = Json(ApiResponse::ok(
        session_dto(session),
        "Signed in successfully",
    ))
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Signed out", body = ApiResponse<String>),
        (status = 401, description = "No session presented", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    trace!("Entering logout function");

    let token = session_token(&headers).ok_or(AuthError::NotAuthenticated)?;
    state.auth.sign_out(&token).await?;
    state.forget_session(&token).await;
    info!("Session ended");

    let mut response = Json(ApiResponse::ok(
        "Signed out".to_string(),
        "Signed out successfully",
    ))
    .into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, clear_session_cookie());
    Ok(response)
}

/// Send a new confirmation email
#[utoipa::path(
    post,
    path = "/auth/resend",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Sent if the address has an unconfirmed account", body = ApiResponse<String>),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn resend_confirmation(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<EmailRequest>>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering resend_confirmation function");

    state.auth.resend_confirmation(&request.email).await?;
    Ok(Json(ApiResponse::ok(
        request.email,
        "If the account exists and is unconfirmed, a new link was sent",
    )))
}

/// Send a password reset email
#[utoipa::path(
    post,
    path = "/auth/recover",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Sent if the address has an account", body = ApiResponse<String>),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn recover_password(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<EmailRequest>>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering recover_password function");

    state.auth.request_password_reset(&request.email).await?;
    Ok(Json(ApiResponse::ok(
        request.email,
        "If the account exists, a password reset link was sent",
    )))
}

/// Set a new password with a reset code; every session of the account ends
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 400, description = "Invalid code or weak password", body = ErrorResponse),
        (status = 503, description = "Authentication backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ResetPasswordRequest>>,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering reset_password function");

    let user_id = state
        .auth
        .reset_password(request.code.trim(), &request.password)
        .await?;
    state.forget_user_sessions(user_id);
    info!("Password of user {} was reset", user_id);

    Ok(Json(ApiResponse::ok(
        "Password updated".to_string(),
        "Password updated successfully; sign in again",
    )))
}

/// The signed-in user and when the session expires
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionInfoDto>),
        (status = 401, description = "Not authenticated or session expired", body = ErrorResponse)
    )
)]
#[instrument(skip(current))]
pub async fn get_session(current: CurrentUser) -> ApiResult<Json<ApiResponse<SessionInfoDto>>> {
    debug!("Describing session of user {}", current.user.id);
    Ok(Json(ApiResponse::ok(
        SessionInfoDto {
            user_id: current.user.id,
            email: current.user.email,
            expires_at: current.user.expires_at,
        },
        "Session retrieved successfully",
    )))
}
