use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::helpers::converters::{expense_dto, income_dto, money, monthly_total_dto, transaction_dto};
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, response::Json};
use common::DashboardSummary;
use compute::{balance, emergency_fund, monthly_totals, most_recent, total_of};
use tracing::{debug, info, instrument, trace};

pub const RECENT_INCOMES: usize = 3;
pub const RECENT_EXPENSES: usize = 3;
pub const RECENT_TRANSACTIONS: u64 = 5;

/// Totals, balance, emergency fund, recent entries and monthly totals
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "summaries",
    responses(
        (status = 200, description = "Dashboard computed successfully", body = ApiResponse<DashboardSummary>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 503, description = "Finance backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<DashboardSummary>>> {
    trace!("Entering get_dashboard function");
    let user_id = current.user.id;

    let (incomes, expenses, transactions) = tokio::try_join!(
        state.store.list_incomes(user_id),
        state.store.list_expenses(user_id, None),
        state.store.list_transactions(user_id, Some(RECENT_TRANSACTIONS)),
    )?;
    debug!(
        "Fetched {} incomes, {} expenses and {} transactions",
        incomes.len(),
        expenses.len(),
        transactions.len()
    );

    let monthly = monthly_totals(&incomes, &expenses, &state.settings.timezone);
    let summary = DashboardSummary {
        total_income: money(total_of(&incomes)),
        total_expenses: money(total_of(&expenses)),
        balance: money(balance(&incomes, &expenses)),
        emergency_fund: money(emergency_fund(&expenses)),
        recent_incomes: most_recent(&incomes, RECENT_INCOMES, |income| income.created_at)
            .into_iter()
            .map(income_dto)
            .collect(),
        recent_expenses: most_recent(&expenses, RECENT_EXPENSES, |expense| expense.created_at)
            .into_iter()
            .map(expense_dto)
            .collect(),
        recent_transactions: transactions.into_iter().map(transaction_dto).collect(),
        monthly_totals: monthly.iter().map(monthly_total_dto).collect(),
    };

    info!("Dashboard computed for user {}", user_id);
    Ok(Json(ApiResponse::ok(summary, "Dashboard computed successfully")))
}
