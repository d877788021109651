use std::sync::Arc;
use std::time::Duration;

use common::{
    CategoryDto, CategoryKind, CategoryRefDto, CategoryTotalDto, DashboardSummary, DistributionDto,
    ExpenseDto, IncomeDto, MoneyDto, MonthlyTotalDto, ReportSummary, SessionDto, SessionInfoDto,
    ShareDto, SignUpResponse, TransactionDto, TransactionKind, UserDto,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::auth::{AuthProvider, AuthUser};
use crate::backend::FinanceStore;
use crate::config::Settings;
use crate::handlers::{
    auth::{CredentialsRequest, EmailRequest, ResetPasswordRequest},
    categories::{CategoryQuery, CreateCategoryRequest, UpdateCategoryRequest},
    expenses::{CreateExpenseRequest, ExpenseQuery, UpdateExpenseRequest},
    incomes::{CreateIncomeRequest, UpdateIncomeRequest},
    transactions::{CreateTransactionRequest, TransactionQuery, UpdateTransactionRequest},
};

pub use common::ApiResponse;

/// Upper bound on cached sessions.
const SESSION_CACHE_CAPACITY: u64 = 10_000;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence client for the finance records
    pub store: Arc<dyn FinanceStore>,
    pub auth: Arc<dyn AuthProvider>,
    /// Resolved sessions by token
    pub sessions: Cache<String, AuthUser>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FinanceStore>,
        auth: Arc<dyn AuthProvider>,
        settings: Settings,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(SESSION_CACHE_CAPACITY)
            .time_to_live(Duration::from_secs(settings.session_cache_ttl_secs))
            .support_invalidation_closures()
            .build();
        Self {
            store,
            auth,
            sessions,
            settings: Arc::new(settings),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Stable error code, e.g. `NOT_FOUND`
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the backend is unreachable
    pub status: String,
    /// Service version
    pub version: String,
    /// Backend connection status
    pub backend: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::sign_up,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::resend_confirmation,
        crate::handlers::auth::recover_password,
        crate::handlers::auth::reset_password,
        crate::handlers::auth::get_session,
        crate::redirect::auth_callback,
        crate::handlers::incomes::create_income,
        crate::handlers::incomes::get_incomes,
        crate::handlers::incomes::get_income,
        crate::handlers::incomes::update_income,
        crate::handlers::incomes::delete_income,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::transactions::create_transaction,
        crate::handlers::transactions::get_transactions,
        crate::handlers::transactions::update_transaction,
        crate::handlers::transactions::delete_transaction,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::reports::get_report,
        crate::handlers::profile::delete_profile,
    ),
    components(
        schemas(
            ApiResponse<IncomeDto>,
            ApiResponse<DashboardSummary>,
            ApiResponse<ReportSummary>,
            ErrorResponse,
            HealthResponse,
            CredentialsRequest,
            EmailRequest,
            ResetPasswordRequest,
            CreateIncomeRequest,
            UpdateIncomeRequest,
            ExpenseQuery,
            CreateExpenseRequest,
            UpdateExpenseRequest,
            CategoryQuery,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            TransactionQuery,
            CreateTransactionRequest,
            UpdateTransactionRequest,
            IncomeDto,
            ExpenseDto,
            CategoryDto,
            CategoryKind,
            CategoryRefDto,
            TransactionDto,
            TransactionKind,
            MoneyDto,
            MonthlyTotalDto,
            ShareDto,
            DistributionDto,
            CategoryTotalDto,
            DashboardSummary,
            ReportSummary,
            UserDto,
            SessionDto,
            SignUpResponse,
            SessionInfoDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Sign-up, sign-in and email links"),
        (name = "incomes", description = "Income records"),
        (name = "expenses", description = "Expense records"),
        (name = "categories", description = "Categories for incomes, expenses and transactions"),
        (name = "transactions", description = "Dated transactions"),
        (name = "summaries", description = "Dashboard and report aggregates"),
        (name = "profile", description = "Account removal"),
    ),
    info(
        title = "Financeiro API",
        description = "Personal finance tracker - incomes, expenses, categories and monthly summaries",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
