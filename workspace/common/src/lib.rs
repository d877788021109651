//! Common transport-layer types returned by the HTTP API.
//! Handlers build these from entity models and aggregation results, and
//! clients can deserialize responses without duplicating shapes.

mod auth;
mod summary;

pub use auth::{SessionDto, SessionInfoDto, SignUpResponse, UserDto};
pub use summary::{
    CategoryTotalDto, DashboardSummary, DistributionDto, MoneyDto, MonthlyTotalDto, ReportSummary,
    ShareDto,
};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Generic API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Which entries a category applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
    Both,
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

// ===================== Records =====================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct IncomeDto {
    pub id: Uuid,
    pub description: String,
    /// Decimal amount, serialized as a string
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Decimal,
    pub category: String,
    pub is_recurrent: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExpenseDto {
    pub id: Uuid,
    pub description: String,
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
    pub category: String,
    pub category_id: Option<Uuid>,
    pub is_essential: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// The category embedded in a transaction listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryRefDto {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TransactionDto {
    pub id: Uuid,
    pub description: String,
    #[schema(value_type = String, example = "89.90")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category_id: Option<Uuid>,
    /// Joined category, absent when uncategorized
    pub category: Option<CategoryRefDto>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}
