use crate::auth::CurrentUser;
use crate::backend::{ExpensePatch, NewExpense};
use crate::error::ApiResult;
use crate::helpers::converters::expense_dto;
use crate::helpers::{double_option, validate_not_blank, validate_positive_amount};
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::ExpenseDto;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing expenses
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ExpenseQuery {
    /// Only essential (`true`) or only non-essential (`false`) expenses
    pub essential: Option<bool>,
}

/// Request body for recording an expense
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateExpenseRequest {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: String,
    /// Must be greater than zero
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = String, example = "250.00")]
    pub amount: Decimal,
    /// Category name; defaults to the linked category's name, then "Geral"
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub category: Option<String>,
    /// Category this expense belongs to
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_essential: bool,
}

/// Request body for updating an expense; omitted fields are kept
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateExpenseRequest {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<String>, example = "250.00")]
    pub amount: Option<Decimal>,
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub category: Option<String>,
    /// `null` unlinks the category
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    pub is_essential: Option<bool>,
}

/// Record a new expense
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    tag = "expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created successfully", body = ApiResponse<ExpenseDto>),
        (status = 400, description = "Invalid request or category", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn create_expense(
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<CreateExpenseRequest>>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ExpenseDto>>)> {
    trace!("Entering create_expense function");
    debug!(
        "Creating expense '{}' (essential: {}) for user {}",
        request.description, request.is_essential, current.user.id
    );

    let created = state
        .store
        .create_expense(
            current.user.id,
            NewExpense {
                description: request.description.trim().to_string(),
                amount: request.amount,
                category: request.category.map(|c| c.trim().to_string()),
                category_id: request.category_id,
                is_essential: request.is_essential,
            },
        )
        .await?;

    info!("Expense created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(expense_dto(created), "Expense created successfully")),
    ))
}

/// List the user's expenses, newest first
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    tag = "expenses",
    params(ExpenseQuery),
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseDto>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_expenses(
    Query(query): Query<ExpenseQuery>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<ExpenseDto>>>> {
    trace!("Entering get_expenses function");
    debug!("Listing expenses with essential filter: {:?}", query.essential);

    let expenses = state
        .store
        .list_expenses(current.user.id, query.essential)
        .await?;
    info!("Retrieved {} expenses", expenses.len());

    let data = expenses.into_iter().map(expense_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Expenses retrieved successfully")))
}

/// Get one expense
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = Uuid, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ApiResponse<ExpenseDto>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_expense(
    Path(expense_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<ExpenseDto>>> {
    trace!("Entering get_expense function for expense_id: {}", expense_id);

    let expense = state.store.get_expense(current.user.id, expense_id).await?;
    Ok(Json(ApiResponse::ok(
        expense_dto(expense),
        "Expense retrieved successfully",
    )))
}

/// Update an expense
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = Uuid, Path, description = "Expense ID"),
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated successfully", body = ApiResponse<ExpenseDto>),
        (status = 400, description = "Invalid request or category", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn update_expense(
    Path(expense_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<UpdateExpenseRequest>>,
) -> ApiResult<Json<ApiResponse<ExpenseDto>>> {
    trace!("Entering update_expense function for expense_id: {}", expense_id);

    let patch = ExpensePatch {
        description: request.description.map(|d| d.trim().to_string()),
        amount: request.amount,
        category: request.category.map(|c| c.trim().to_string()),
        category_id: request.category_id,
        is_essential: request.is_essential,
    };
    let updated = state
        .store
        .update_expense(current.user.id, expense_id, patch)
        .await?;

    info!("Expense {} updated successfully", updated.id);
    Ok(Json(ApiResponse::ok(
        expense_dto(updated),
        "Expense updated successfully",
    )))
}

/// Delete an expense
#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = Uuid, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn delete_expense(
    Path(expense_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_expense function for expense_id: {}", expense_id);

    state.store.delete_expense(current.user.id, expense_id).await?;

    info!("Expense {} deleted successfully", expense_id);
    Ok(Json(ApiResponse::ok(
        format!("Expense {} deleted", expense_id),
        "Expense deleted successfully",
    )))
}
