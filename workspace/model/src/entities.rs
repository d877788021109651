//! Root of the SeaORM entity modules.
//!
//! `users`, `auth_sessions` and `auth_codes` belong to the auth provider.
//! The finance tables carry a `user_id` but no foreign key to `users`, so the
//! finance store can run against a database that does not hold accounts.

pub mod auth_code;
pub mod auth_session;
pub mod category;
pub mod expense;
pub mod income;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::auth_code::Entity as AuthCode;
    pub use super::auth_session::Entity as AuthSession;
    pub use super::category::Entity as Category;
    pub use super::expense::Entity as Expense;
    pub use super::income::Entity as Income;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{Duration, NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, QueryFilter, QueryOrder, Set,
    };
    use uuid::Uuid;

    use super::auth_code::CodePurpose;
    use super::category::CategoryKind;
    use super::prelude::*;
    use super::transaction::TransactionKind;
    use super::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;
        Ok(db)
    }

    #[tokio::test]
    async fn test_create_and_read_all_entities() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let owner = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set("ana@example.com".to_string()),
            password_hash: Set("$argon2id$placeholder".to_string()),
            email_confirmed_at: Set(Some(now)),
            created_at: Set(now),
            last_sign_in_at: Set(None),
        }
        .insert(&db)
        .await?;

        auth_session::ActiveModel {
            token: Set("session-token".to_string()),
            user_id: Set(owner.id),
            expires_at: Set(now + Duration::hours(1)),
            created_at: Set(now),
        }
        .insert(&db)
        .await?;

        auth_code::ActiveModel {
            code: Set("confirm-code".to_string()),
            user_id: Set(owner.id),
            purpose: Set(CodePurpose::ConfirmEmail),
            expires_at: Set(now + Duration::hours(1)),
            created_at: Set(now),
        }
        .insert(&db)
        .await?;

        let housing = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Moradia".to_string()),
            kind: Set(CategoryKind::Expense),
            created_at: Set(now),
            user_id: Set(owner.id),
        }
        .insert(&db)
        .await?;

        income::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set("Salário".to_string()),
            amount: Set(Decimal::from(1000)),
            category: Set("Geral".to_string()),
            is_recurrent: Set(true),
            created_at: Set(now),
            user_id: Set(owner.id),
        }
        .insert(&db)
        .await?;

        let rent = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set("Aluguel".to_string()),
            amount: Set(Decimal::from(400)),
            category: Set(housing.name.clone()),
            category_id: Set(Some(housing.id)),
            is_essential: Set(true),
            created_at: Set(now),
            user_id: Set(owner.id),
        }
        .insert(&db)
        .await?;

        transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            description: Set("Aluguel de maio".to_string()),
            amount: Set(Decimal::from(400)),
            kind: Set(TransactionKind::Expense),
            category_id: Set(Some(housing.id)),
            date: Set(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()),
            created_at: Set(now),
            user_id: Set(owner.id),
        }
        .insert(&db)
        .await?;

        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 1);
        assert!(users[0].is_confirmed());

        let incomes = Income::find().all(&db).await?;
        assert_eq!(incomes.len(), 1);
        assert_eq!(incomes[0].amount, Decimal::from(1000));
        assert!(incomes[0].is_recurrent);

        let expenses = Expense::find()
            .filter(expense::Column::UserId.eq(owner.id))
            .all(&db)
            .await?;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, rent.id);
        assert_eq!(expenses[0].category_id, Some(housing.id));

        let housing_transactions = housing.find_related(Transaction).all(&db).await?;
        assert_eq!(housing_transactions.len(), 1);
        assert_eq!(housing_transactions[0].kind, TransactionKind::Expense);

        let with_category = Transaction::find()
            .find_also_related(Category)
            .order_by_desc(transaction::Column::Date)
            .all(&db)
            .await?;
        assert_eq!(with_category.len(), 1);
        assert_eq!(
            with_category[0].1.as_ref().map(|c| c.name.as_str()),
            Some("Moradia")
        );

        let codes = owner.find_related(AuthCode).all(&db).await?;
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].purpose, CodePurpose::ConfirmEmail);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_sessions_and_codes() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let owner = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set("bruno@example.com".to_string()),
            password_hash: Set("$argon2id$placeholder".to_string()),
            email_confirmed_at: Set(None),
            created_at: Set(now),
            last_sign_in_at: Set(None),
        }
        .insert(&db)
        .await?;

        auth_session::ActiveModel {
            token: Set("another-token".to_string()),
            user_id: Set(owner.id),
            expires_at: Set(now + Duration::hours(1)),
            created_at: Set(now),
        }
        .insert(&db)
        .await?;

        owner.delete(&db).await?;

        assert!(AuthSession::find().all(&db).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_category_accepts_own_kind_and_both() {
        let now = Utc::now();
        let make = |kind| category::Model {
            id: Uuid::new_v4(),
            name: "Qualquer".to_string(),
            kind,
            created_at: now,
            user_id: Uuid::new_v4(),
        };

        assert!(make(CategoryKind::Both).accepts(CategoryKind::Income));
        assert!(make(CategoryKind::Expense).accepts(CategoryKind::Expense));
        assert!(!make(CategoryKind::Expense).accepts(CategoryKind::Income));
    }
}
