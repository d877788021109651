use sea_orm::entity::prelude::*;

/// An account that can sign in. Only the auth provider reads or writes this table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored trimmed and lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub email_confirmed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub last_sign_in_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auth_session::Entity")]
    AuthSession,
    #[sea_orm(has_many = "super::auth_code::Entity")]
    AuthCode,
}

impl Related<super::auth_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthSession.def()
    }
}

impl Related<super::auth_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthCode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}
