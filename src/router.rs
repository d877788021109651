use crate::auth::require_api_key;
use crate::handlers::{
    auth::{
        get_session, login, logout, recover_password, resend_confirmation, reset_password, sign_up,
    },
    categories::{create_category, delete_category, get_categories, get_category, update_category},
    dashboard::get_dashboard,
    expenses::{create_expense, delete_expense, get_expense, get_expenses, update_expense},
    health::health_check,
    incomes::{create_income, delete_income, get_income, get_incomes, update_income},
    profile::delete_profile,
    reports::get_report,
    transactions::{create_transaction, delete_transaction, get_transactions, update_transaction},
};
use crate::redirect::auth_callback;
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes that need the `apikey` header
fn keyed_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/resend", post(resend_confirmation))
        .route("/auth/recover", post(recover_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/session", get(get_session))
        // Income CRUD routes
        .route("/api/v1/incomes", post(create_income).get(get_incomes))
        .route(
            "/api/v1/incomes/:income_id",
            get(get_income).put(update_income).delete(delete_income),
        )
        // Expense CRUD routes
        .route("/api/v1/expenses", post(create_expense).get(get_expenses))
        .route(
            "/api/v1/expenses/:expense_id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        // Category CRUD routes
        .route("/api/v1/categories", post(create_category).get(get_categories))
        .route(
            "/api/v1/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Transaction routes
        .route(
            "/api/v1/transactions",
            post(create_transaction).get(get_transactions),
        )
        .route("/api/v1/transactions/:transaction_id", put(update_transaction))
        .route("/api/v1/transactions/:transaction_id", delete(delete_transaction))
        // Summaries
        .route("/api/v1/dashboard", get(get_dashboard))
        .route("/api/v1/reports", get(get_report))
        .route("/api/v1/profile", delete(delete_profile))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Public routes
        .route("/health", get(health_check))
        .route("/auth/callback", get(auth_callback))
        .merge(keyed_routes(state.clone()))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
