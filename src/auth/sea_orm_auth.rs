use std::sync::Arc;

use argon2::Params;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use model::entities::{
    auth_code::{self, CodePurpose},
    auth_session, user,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::{
    Account, AuthError, AuthProvider, AuthSession, AuthUser, CodeNotifier, MIN_PASSWORD_LEN,
    SignUpOutcome, normalize_email,
};

/// Tunables of [`SeaOrmAuth`].
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub code_ttl: Duration,
    /// When set, sign-up sends a confirmation code instead of signing in
    pub require_email_confirmation: bool,
    pub password_params: Params,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::seconds(86_400),
            code_ttl: Duration::seconds(3_600),
            require_email_confirmation: true,
            password_params: Params::default(),
        }
    }
}

/// [`AuthProvider`] storing accounts, sessions and codes through SeaORM.
pub struct SeaOrmAuth {
    db: DatabaseConnection,
    notifier: Arc<dyn CodeNotifier>,
    settings: AuthSettings,
}

/// 256 bits of randomness, hex encoded.
fn new_session_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

fn new_code() -> String {
    Uuid::new_v4().simple().to_string()
}

fn check_password_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

impl SeaOrmAuth {
    pub fn new(
        db: DatabaseConnection,
        notifier: Arc<dyn CodeNotifier>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            db,
            notifier,
            settings,
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let params = self.settings.password_params.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, &params))
            .await
            .map_err(|e| AuthError::Backend(format!("hashing task failed: {}", e)))?
    }

    async fn verify(&self, hash: String, password: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let params = self.settings.password_params.clone();
        tokio::task::spawn_blocking(move || verify_password(&hash, &password, &params))
            .await
            .map_err(|e| AuthError::Backend(format!("verification task failed: {}", e)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?)
    }

    async fn create_session(&self, user: user::Model) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        let session = auth_session::ActiveModel {
            token: Set(new_session_token()),
            user_id: Set(user.id),
            expires_at: Set(now + self.settings.session_ttl),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;
        debug!("Issued session for user {}", user.id);
        Ok(AuthSession {
            token: session.token,
            expires_at: session.expires_at,
            user: Account::from(user),
        })
    }

    /// Replaces any pending code of the same purpose and sends the new one.
    async fn issue_code(&self, user: &user::Model, purpose: CodePurpose) -> Result<(), AuthError> {
        auth_code::Entity::delete_many()
            .filter(auth_code::Column::UserId.eq(user.id))
            .filter(auth_code::Column::Purpose.eq(purpose))
            .exec(&self.db)
            .await?;

        let now = Utc::now();
        let code = auth_code::ActiveModel {
            code: Set(new_code()),
            user_id: Set(user.id),
            purpose: Set(purpose),
            expires_at: Set(now + self.settings.code_ttl),
            created_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!("Issued {:?} code for user {}", purpose, user.id);
        self.notifier.send_code(&user.email, purpose, &code.code).await;
        Ok(())
    }

    /// Consumes a code. Used, unknown, expired and wrong-purpose codes are all
    /// `InvalidCode`.
    async fn take_code(
        &self,
        code: &str,
        purpose: Option<CodePurpose>,
    ) -> Result<auth_code::Model, AuthError> {
        let found = auth_code::Entity::find_by_id(code.to_owned())
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidCode)?;
        if purpose.is_some_and(|purpose| purpose != found.purpose) {
            warn!("Code presented for the wrong purpose");
            return Err(AuthError::InvalidCode);
        }

        let deleted = auth_code::Entity::delete_by_id(code.to_owned())
            .exec(&self.db)
            .await?;
        if deleted.rows_affected == 0 {
            // Consumed concurrently.
            return Err(AuthError::InvalidCode);
        }
        if found.is_expired(Utc::now()) {
            debug!("Expired code presented for user {}", found.user_id);
            return Err(AuthError::InvalidCode);
        }
        Ok(found)
    }

    async fn load_user(&self, user_id: Uuid) -> Result<user::Model, AuthError> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AuthError::NotAuthenticated)
    }
}

fn registration_error(err: DbErr) -> AuthError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AuthError::EmailAlreadyRegistered,
        _ => AuthError::from(err),
    }
}

#[async_trait]
impl AuthProvider for SeaOrmAuth {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        check_password_strength(password)?;
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            debug!("Sign-up for an existing email rejected");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let password_hash = self.hash(password).await?;
        let now = Utc::now();
        let confirm_later = self.settings.require_email_confirmation;
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            email_confirmed_at: Set(if confirm_later { None } else { Some(now) }),
            created_at: Set(now),
            last_sign_in_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(registration_error)?;
        info!("Registered user {}", user.id);

        if confirm_later {
            self.issue_code(&user, CodePurpose::ConfirmEmail).await?;
            return Ok(SignUpOutcome {
                user: Account::from(user),
                session: None,
            });
        }

        let session = self.create_session(user.clone()).await?;
        Ok(SignUpOutcome {
            user: Account::from(user),
            session: Some(session),
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let Some(user) = self.find_by_email(email).await? else {
            debug!("Sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify(user.password_hash.clone(), password).await? {
            debug!("Wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_confirmed() {
            return Err(AuthError::EmailNotConfirmed);
        }

        let mut active = user.into_active_model();
        active.last_sign_in_at = Set(Some(Utc::now()));
        let user = active.update(&self.db).await?;
        info!("User {} signed in", user.id);
        self.create_session(user).await
    }

    #[instrument(skip(self))]
    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        match self.find_by_email(email).await? {
            Some(user) if !user.is_confirmed() => {
                self.issue_code(&user, CodePurpose::ConfirmEmail).await
            }
            _ => {
                debug!("Nothing to resend");
                Ok(())
            }
        }
    }

    #[instrument(skip(self, code))]
    async fn exchange_code_for_session(&self, code: &str) -> Result<AuthSession, AuthError> {
        let code = self.take_code(code, None).await?;
        let user = self.load_user(code.user_id).await?;

        // Both kinds of code prove control of the mailbox.
        let user = if user.is_confirmed() {
            user
        } else {
            let mut active = user.into_active_model();
            active.email_confirmed_at = Set(Some(Utc::now()));
            let user = active.update(&self.db).await?;
            info!("Confirmed email of user {}", user.id);
            user
        };
        self.create_session(user).await
    }

    #[instrument(skip(self))]
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        match self.find_by_email(email).await? {
            Some(user) => self.issue_code(&user, CodePurpose::ResetPassword).await,
            None => {
                debug!("Password reset requested for unknown email");
                Ok(())
            }
        }
    }

    #[instrument(skip(self, code, new_password))]
    async fn reset_password(&self, code: &str, new_password: &str) -> Result<Uuid, AuthError> {
        check_password_strength(new_password)?;
        let code = self.take_code(code, Some(CodePurpose::ResetPassword)).await?;
        let user = self.load_user(code.user_id).await?;
        let password_hash = self.hash(new_password).await?;
        let user_id = user.id;

        let txn = self.db.begin().await?;
        let confirmed_at = user.email_confirmed_at.unwrap_or_else(Utc::now);
        let mut active = user.into_active_model();
        active.password_hash = Set(password_hash);
        active.email_confirmed_at = Set(Some(confirmed_at));
        active.update(&txn).await?;
        let ended = auth_session::Entity::delete_many()
            .filter(auth_session::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(
            "Reset password of user {} and ended {} sessions",
            user_id, ended.rows_affected
        );
        Ok(user_id)
    }

    #[instrument(skip(self, token))]
    async fn resolve_session(&self, token: &str) -> Result<AuthUser, AuthError> {
        let session = auth_session::Entity::find_by_id(token.to_owned())
            .one(&self.db)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        if session.is_expired(Utc::now()) {
            auth_session::Entity::delete_by_id(session.token)
                .exec(&self.db)
                .await?;
            debug!("Removed expired session of user {}", session.user_id);
            return Err(AuthError::SessionExpired);
        }

        let user = self.load_user(session.user_id).await?;
        Ok(AuthUser {
            id: user.id,
            email: user.email,
            expires_at: session.expires_at,
        })
    }

    #[instrument(skip(self, token))]
    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let result = auth_session::Entity::delete_by_id(token.to_owned())
            .exec(&self.db)
            .await?;
        debug!("Signed out, {} session removed", result.rows_affected);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        let txn = self.db.begin().await?;
        auth_session::Entity::delete_many()
            .filter(auth_session::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        auth_code::Entity::delete_many()
            .filter(auth_code::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        let deleted = user::Entity::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;

        if deleted.rows_affected == 0 {
            warn!("User {} was already gone", user_id);
        } else {
            info!("Deleted user {}", user_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::{RecordingNotifier, setup_test_db, test_auth_settings};

    async fn provider(require_email_confirmation: bool) -> (SeaOrmAuth, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let settings = AuthSettings {
            require_email_confirmation,
            ..test_auth_settings()
        };
        let auth = SeaOrmAuth::new(
            setup_test_db().await,
            Arc::new(notifier.clone()),
            settings,
        );
        (auth, notifier)
    }

    #[tokio::test]
    async fn test_sign_up_without_confirmation_returns_session() {
        let (auth, notifier) = provider(false).await;

        let outcome = auth.sign_up(" Carla@Example.com ", "segredo123").await.unwrap();

        assert_eq!(outcome.user.email, "carla@example.com");
        assert!(outcome.user.email_confirmed_at.is_some());
        let session = outcome.session.expect("session issued");
        assert_eq!(session.token.len(), 64);
        assert!(notifier.sent().is_empty());

        let resolved = auth.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved.id, outcome.user.id);
    }

    #[tokio::test]
    async fn test_confirmation_flow() {
        let (auth, notifier) = provider(true).await;

        let outcome = auth.sign_up("davi@example.com", "segredo123").await.unwrap();
        assert!(outcome.session.is_none());

        assert_eq!(
            auth.sign_in_with_password("davi@example.com", "segredo123").await,
            Err(AuthError::EmailNotConfirmed)
        );

        let code = notifier
            .last_code("davi@example.com", CodePurpose::ConfirmEmail)
            .expect("confirmation code sent");
        let session = auth.exchange_code_for_session(&code).await.unwrap();
        assert!(session.user.email_confirmed_at.is_some());

        // Single use.
        assert_eq!(
            auth.exchange_code_for_session(&code).await,
            Err(AuthError::InvalidCode)
        );
        assert!(auth.sign_in_with_password("DAVI@example.com", "segredo123").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let (auth, _) = provider(false).await;

        assert_eq!(
            auth.sign_up("eva@example.com", "12345").await,
            Err(AuthError::WeakPassword)
        );
        auth.sign_up("eva@example.com", "123456").await.unwrap();
        assert_eq!(
            auth.sign_up("EVA@example.com", "outrasenha").await,
            Err(AuthError::EmailAlreadyRegistered)
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let (auth, _) = provider(false).await;
        auth.sign_up("fabio@example.com", "segredo123").await.unwrap();

        assert_eq!(
            auth.sign_in_with_password("fabio@example.com", "errada").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.sign_in_with_password("ninguem@example.com", "segredo123").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let (auth, _) = provider(false).await;
        let outcome = auth.sign_up("gabi@example.com", "segredo123").await.unwrap();
        let past = Utc::now() - Duration::hours(1);
        auth_session::ActiveModel {
            token: Set("expired-token".to_string()),
            user_id: Set(outcome.user.id),
            expires_at: Set(past),
            created_at: Set(past - Duration::hours(1)),
        }
        .insert(&auth.db)
        .await
        .unwrap();

        assert_eq!(
            auth.resolve_session("expired-token").await,
            Err(AuthError::SessionExpired)
        );
        assert_eq!(
            auth.resolve_session("expired-token").await,
            Err(AuthError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn test_sign_out_ends_session() {
        let (auth, _) = provider(false).await;
        let session = auth
            .sign_up("hugo@example.com", "segredo123")
            .await
            .unwrap()
            .session
            .unwrap();

        auth.sign_out(&session.token).await.unwrap();

        assert_eq!(
            auth.resolve_session(&session.token).await,
            Err(AuthError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (auth, notifier) = provider(false).await;
        let outcome = auth.sign_up("iris@example.com", "antiga123").await.unwrap();
        let old_session = outcome.session.unwrap();

        auth.request_password_reset("iris@example.com").await.unwrap();
        auth.request_password_reset("ninguem@example.com").await.unwrap();
        let code = notifier
            .last_code("iris@example.com", CodePurpose::ResetPassword)
            .expect("reset code sent");

        assert_eq!(auth.reset_password(&code, "123").await, Err(AuthError::WeakPassword));
        let user_id = auth.reset_password(&code, "nova12345").await.unwrap();
        assert_eq!(user_id, outcome.user.id);

        assert_eq!(
            auth.resolve_session(&old_session.token).await,
            Err(AuthError::NotAuthenticated)
        );
        assert_eq!(
            auth.sign_in_with_password("iris@example.com", "antiga123").await,
            Err(AuthError::InvalidCredentials)
        );
        assert!(auth.sign_in_with_password("iris@example.com", "nova12345").await.is_ok());
    }

    #[tokio::test]
    async fn test_confirmation_code_cannot_reset_password() {
        let (auth, notifier) = provider(true).await;
        auth.sign_up("joao@example.com", "segredo123").await.unwrap();
        let code = notifier
            .last_code("joao@example.com", CodePurpose::ConfirmEmail)
            .unwrap();

        assert_eq!(
            auth.reset_password(&code, "outra12345").await,
            Err(AuthError::InvalidCode)
        );
        // Still usable for what it was issued for.
        assert!(auth.exchange_code_for_session(&code).await.is_ok());
    }

    #[tokio::test]
    async fn test_resend_replaces_pending_code() {
        let (auth, notifier) = provider(true).await;
        auth.sign_up("lara@example.com", "segredo123").await.unwrap();
        let first = notifier
            .last_code("lara@example.com", CodePurpose::ConfirmEmail)
            .unwrap();

        auth.resend_confirmation("lara@example.com").await.unwrap();
        let second = notifier
            .last_code("lara@example.com", CodePurpose::ConfirmEmail)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(
            auth.exchange_code_for_session(&first).await,
            Err(AuthError::InvalidCode)
        );
        assert!(auth.exchange_code_for_session(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_removes_account_and_sessions() {
        let (auth, _) = provider(false).await;
        let outcome = auth.sign_up("mario@example.com", "segredo123").await.unwrap();
        let session = outcome.session.unwrap();

        auth.delete_user(outcome.user.id).await.unwrap();

        assert_eq!(
            auth.resolve_session(&session.token).await,
            Err(AuthError::NotAuthenticated)
        );
        assert_eq!(
            auth.sign_in_with_password("mario@example.com", "segredo123").await,
            Err(AuthError::InvalidCredentials)
        );
    }
}
