use crate::auth::CurrentUser;
use crate::backend::{IncomePatch, NewIncome};
use crate::error::ApiResult;
use crate::helpers::converters::income_dto;
use crate::helpers::{validate_not_blank, validate_positive_amount};
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::IncomeDto;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request body for recording an income
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateIncomeRequest {
    /// What the income is, e.g. "Salário"
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: String,
    /// Must be greater than zero
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Decimal,
    /// Category name (default: "Geral")
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub category: Option<String>,
    /// Whether the income repeats every month (default: false)
    #[serde(default)]
    pub is_recurrent: bool,
}

/// Request body for updating an income; omitted fields are kept
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateIncomeRequest {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<String>, example = "1500.00")]
    pub amount: Option<Decimal>,
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub category: Option<String>,
    pub is_recurrent: Option<bool>,
}

/// Record a new income
#[utoipa::path(
    post,
    path = "/api/v1/incomes",
    tag = "incomes",
    request_body = CreateIncomeRequest,
    responses(
        (status = 201, description = "Income created successfully", body = ApiResponse<IncomeDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn create_income(
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<CreateIncomeRequest>>,
) -> ApiResult<(StatusCode, Json<ApiResponse<IncomeDto>>)> {
    trace!("Entering create_income function");
    debug!("Creating income '{}' for user {}", request.description, current.user.id);

    let created = state
        .store
        .create_income(
            current.user.id,
            NewIncome {
                description: request.description.trim().to_string(),
                amount: request.amount,
                category: request.category.map(|c| c.trim().to_string()),
                is_recurrent: request.is_recurrent,
            },
        )
        .await?;

    info!("Income created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(income_dto(created), "Income created successfully")),
    ))
}

/// List the user's incomes, newest first
#[utoipa::path(
    get,
    path = "/api/v1/incomes",
    tag = "incomes",
    responses(
        (status = 200, description = "Incomes retrieved successfully", body = ApiResponse<Vec<IncomeDto>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_incomes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<IncomeDto>>>> {
    trace!("Entering get_incomes function");

    let incomes = state.store.list_incomes(current.user.id).await?;
    info!("Retrieved {} incomes", incomes.len());

    let data = incomes.into_iter().map(income_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Incomes retrieved successfully")))
}

/// Get one income
#[utoipa::path(
    get,
    path = "/api/v1/incomes/{income_id}",
    tag = "incomes",
    params(
        ("income_id" = Uuid, Path, description = "Income ID"),
    ),
    responses(
        (status = 200, description = "Income retrieved successfully", body = ApiResponse<IncomeDto>),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_income(
    Path(income_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<IncomeDto>>> {
    trace!("Entering get_income function for income_id: {}", income_id);

    let income = state.store.get_income(current.user.id, income_id).await?;
    debug!("Found income {}", income.id);
    Ok(Json(ApiResponse::ok(
        income_dto(income),
        "Income retrieved successfully",
    )))
}

/// Update an income
#[utoipa::path(
    put,
    path = "/api/v1/incomes/{income_id}",
    tag = "incomes",
    params(
        ("income_id" = Uuid, Path, description = "Income ID"),
    ),
    request_body = UpdateIncomeRequest,
    responses(
        (status = 200, description = "Income updated successfully", body = ApiResponse<IncomeDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn update_income(
    Path(income_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<UpdateIncomeRequest>>,
) -> ApiResult<Json<ApiResponse<IncomeDto>>> {
    trace!("Entering update_income function for income_id: {}", income_id);

    let patch = IncomePatch {
        description: request.description.map(|d| d.trim().to_string()),
        amount: request.amount,
        category: request.category.map(|c| c.trim().to_string()),
        is_recurrent: request.is_recurrent,
    };
    let updated = state
        .store
        .update_income(current.user.id, income_id, patch)
        .await?;

    info!("Income {} updated successfully", updated.id);
    Ok(Json(ApiResponse::ok(
        income_dto(updated),
        "Income updated successfully",
    )))
}

/// Delete an income
#[utoipa::path(
    delete,
    path = "/api/v1/incomes/{income_id}",
    tag = "incomes",
    params(
        ("income_id" = Uuid, Path, description = "Income ID"),
    ),
    responses(
        (status = 200, description = "Income deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn delete_income(
    Path(income_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_income function for income_id: {}", income_id);

    state.store.delete_income(current.user.id, income_id).await?;

    info!("Income {} deleted successfully", income_id);
    Ok(Json(ApiResponse::ok(
        format!("Income {} deleted", income_id),
        "Income deleted successfully",
    )))
}
