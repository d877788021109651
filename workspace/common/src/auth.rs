//! Account and session payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A signed-in session. Send `access_token` as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionDto {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SignUpResponse {
    pub user: UserDto,
    /// Absent while the email still needs confirming
    pub session: Option<SessionDto>,
    pub confirmation_required: bool,
}

/// The user behind the current session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SessionInfoDto {
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}
