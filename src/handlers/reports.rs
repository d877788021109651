use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::helpers::converters::{
    category_total_dto, distribution_dto, expense_dto, money, monthly_total_dto,
};
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, response::Json};
use common::ReportSummary;
use compute::{
    EMERGENCY_FUND_MONTHS, balance, emergency_fund, monthly_totals, spending_distribution,
    top_by_amount, total_of, totals_by_category,
};
use tracing::{debug, info, instrument, trace};

pub const TOP_EXPENSES: usize = 5;

/// Spending distribution, emergency fund, monthly and per-category totals
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "summaries",
    responses(
        (status = 200, description = "Report computed successfully", body = ApiResponse<ReportSummary>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 503, description = "Finance backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_report(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<ReportSummary>>> {
    trace!("Entering get_report function");
    let user_id = current.user.id;

    let (incomes, expenses) = tokio::try_join!(
        state.store.list_incomes(user_id),
        state.store.list_expenses(user_id, None),
    )?;
    debug!("Fetched {} incomes and {} expenses", incomes.len(), expenses.len());

    let distribution =
        spending_distribution(&incomes, &expenses, state.settings.spending_policy.as_ref());
    let monthly = monthly_totals(&incomes, &expenses, &state.settings.timezone);
    let report = ReportSummary {
        total_income: money(total_of(&incomes)),
        total_expenses: money(total_of(&expenses)),
        balance: money(balance(&incomes, &expenses)),
        emergency_fund: money(emergency_fund(&expenses)),
        emergency_fund_months: EMERGENCY_FUND_MONTHS,
        distribution: distribution_dto(&distribution),
        monthly_totals: monthly.iter().map(monthly_total_dto).collect(),
        by_category: totals_by_category(&expenses)
            .into_iter()
            .map(category_total_dto)
            .collect(),
        top_expenses: top_by_amount(&expenses, TOP_EXPENSES)
            .into_iter()
            .map(expense_dto)
            .collect(),
    };

    info!("Report computed for user {}", user_id);
    Ok(Json(ApiResponse::ok(report, "Report computed successfully")))
}
