//! Persistence client for incomes, expenses, categories and transactions.
//!
//! Handlers only see [`FinanceStore`]; every call is scoped by the id of the
//! authenticated user, and rows belonging to someone else behave exactly like
//! missing rows.

pub mod sea_orm_store;

use async_trait::async_trait;
use chrono::NaiveDate;
use model::entities::{
    category::{self, CategoryKind},
    expense, income,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

pub use sea_orm_store::SeaOrmStore;

/// Category name used when an income or expense is created without one.
pub const DEFAULT_CATEGORY: &str = "Geral";

/// Errors returned by a [`FinanceStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The row does not exist for this user
    #[error("{0} not found")]
    NotFound(&'static str),
    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),
    /// A referenced row is missing, belongs to someone else or has the wrong kind
    #[error("{0}")]
    InvalidReference(String),
    /// The backend could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[source] DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return StoreError::Conflict(format!("Duplicate value: {}", detail));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return StoreError::InvalidReference(format!("Invalid reference: {}", detail));
            }
            _ => {}
        }
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
                error!("Finance backend connection failed: {}", err);
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewIncome {
    pub description: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub is_recurrent: bool,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct IncomePatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub is_recurrent: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    /// Defaults to the linked category's name, then to [`DEFAULT_CATEGORY`]
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_essential: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    /// `Some(None)` unlinks the category
    pub category_id: Option<Option<Uuid>>,
    pub is_essential: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
}

/// A transaction with its category joined in.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWithCategory {
    pub transaction: transaction::Model,
    pub category: Option<category::Model>,
}

#[async_trait]
pub trait FinanceStore: Send + Sync {
    /// Incomes of the user, newest first.
    async fn list_incomes(&self, user_id: Uuid) -> StoreResult<Vec<income::Model>>;
    async fn get_income(&self, user_id: Uuid, id: Uuid) -> StoreResult<income::Model>;
    async fn create_income(&self, user_id: Uuid, new: NewIncome) -> StoreResult<income::Model>;
    async fn update_income(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: IncomePatch,
    ) -> StoreResult<income::Model>;
    async fn delete_income(&self, user_id: Uuid, id: Uuid) -> StoreResult<()>;

    /// Expenses of the user, newest first, optionally only (non-)essential ones.
    async fn list_expenses(
        &self,
        user_id: Uuid,
        essential: Option<bool>,
    ) -> StoreResult<Vec<expense::Model>>;
    async fn get_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<expense::Model>;
    async fn create_expense(&self, user_id: Uuid, new: NewExpense)
    -> StoreResult<expense::Model>;
    async fn update_expense(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: ExpensePatch,
    ) -> StoreResult<expense::Model>;
    async fn delete_expense(&self, user_id: Uuid, id: Uuid) -> StoreResult<()>;

    /// Categories ordered by name. With a kind, returns that kind and `both`.
    async fn list_categories(
        &self,
        user_id: Uuid,
        kind: Option<CategoryKind>,
    ) -> StoreResult<Vec<category::Model>>;
    async fn get_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<category::Model>;
    async fn create_category(
        &self,
        user_id: Uuid,
        new: NewCategory,
    ) -> StoreResult<category::Model>;
    async fn update_category(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: CategoryPatch,
    ) -> StoreResult<category::Model>;
    /// Deletes the category and unlinks it from expenses and transactions.
    async fn delete_category(&self, user_id: Uuid, id: Uuid) -> StoreResult<()>;

    /// Transactions by date, newest first, with their category.
    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: Option<u64>,
    ) -> StoreResult<Vec<TransactionWithCategory>>;
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> StoreResult<TransactionWithCategory>;
    async fn update_transaction(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<TransactionWithCategory>;
    async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> StoreResult<()>;

    /// Removes every income, expense, transaction and category of the user.
    async fn delete_user_data(&self, user_id: Uuid) -> StoreResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
