//! Authentication: accounts, sessions and one-time email codes.
//!
//! Handlers talk to an [`AuthProvider`]. The production provider keeps
//! accounts in the same database through SeaORM; codes leave the process only
//! through a [`CodeNotifier`].

pub mod extract;
pub mod password;
pub mod sea_orm_auth;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::entities::{auth_code::CodePurpose, user};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub use extract::{
    API_KEY_HEADER, CurrentUser, SESSION_COOKIE, clear_session_cookie, require_api_key,
    session_cookie, session_token,
};
pub use sea_orm_auth::{AuthSettings, SeaOrmAuth};

/// Passwords shorter than this are rejected at sign-up and reset.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Every way an auth call can fail. The HTTP layer maps each variant to a
/// fixed status and code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,
    #[error("Email address is already registered")]
    EmailAlreadyRegistered,
    #[error("Password must be at least 6 characters long")]
    WeakPassword,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Session has expired")]
    SessionExpired,
    #[error("Invalid or expired code")]
    InvalidCode,
    #[error("Authentication backend error: {0}")]
    Backend(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::Backend(err.to_string())
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for Account {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            email_confirmed_at: model.email_confirmed_at,
            created_at: model.created_at,
        }
    }
}

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Account,
}

/// The user a session token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: Account,
    /// `None` until the email is confirmed
    pub session: Option<AuthSession>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;
    /// Issues a new confirmation code. Unknown or confirmed emails succeed silently.
    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError>;
    /// Consumes a code and signs its user in.
    async fn exchange_code_for_session(&self, code: &str) -> Result<AuthSession, AuthError>;
    /// Issues a reset code. Unknown emails succeed silently.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;
    /// Consumes a reset code, sets the new password and ends every session of
    /// that user. Returns the user's id.
    async fn reset_password(&self, code: &str, new_password: &str) -> Result<Uuid, AuthError>;
    async fn resolve_session(&self, token: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
    /// Removes the account with its sessions and codes.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError>;
}

/// Delivers one-time codes to the owner of an email address.
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    async fn send_code(&self, email: &str, purpose: CodePurpose, code: &str);
}

/// Writes the callback link to the log, for deployments without a mail relay.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl CodeNotifier for LogNotifier {
    async fn send_code(&self, email: &str, purpose: CodePurpose, code: &str) {
        let next = match purpose {
            CodePurpose::ConfirmEmail => "/dashboard",
            CodePurpose::ResetPassword => "/reset-password",
        };
        info!(
            target: "financeiro::outbox",
            "Code for {} ({:?}): /auth/callback?code={}&next={}",
            email, purpose, code, next
        );
    }
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana.Souza@Example.COM "), "ana.souza@example.com");
    }

    #[test]
    fn test_weak_password_message_names_minimum() {
        assert_eq!(
            AuthError::WeakPassword.to_string(),
            "Password must be at least 6 characters long"
        );
    }
}
