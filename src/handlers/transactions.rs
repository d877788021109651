use crate::auth::CurrentUser;
use crate::backend::{NewTransaction, TransactionPatch};
use crate::error::ApiResult;
use crate::helpers::converters::{transaction_dto, transaction_kind_from_dto};
use crate::helpers::{double_option, validate_not_blank, validate_positive_amount};
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{TransactionDto, TransactionKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct TransactionQuery {
    /// Maximum number of transactions to return
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<u64>,
}

/// Request body for recording a transaction
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = String, example = "89.90")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Must accept this transaction's type
    pub category_id: Option<Uuid>,
    /// Calendar date of the transaction (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Request body for updating a transaction; omitted fields are kept
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateTransactionRequest {
    #[validate(length(max = 255), custom(function = "validate_not_blank"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    #[schema(value_type = Option<String>, example = "89.90")]
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// `null` unlinks the category
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    pub date: Option<NaiveDate>,
}

/// Record a transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created successfully", body = ApiResponse<TransactionDto>),
        (status = 400, description = "Invalid request or category", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn create_transaction(
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<CreateTransactionRequest>>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TransactionDto>>)> {
    trace!("Entering create_transaction function");
    debug!(
        "Creating {:?} transaction '{}' dated {}",
        request.kind, request.description, request.date
    );

    let created = state
        .store
        .create_transaction(
            current.user.id,
            NewTransaction {
                description: request.description.trim().to_string(),
                amount: request.amount,
                kind: transaction_kind_from_dto(request.kind),
                category_id: request.category_id,
                date: request.date,
            },
        )
        .await?;

    info!(
        "Transaction created successfully with ID: {}",
        created.transaction.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            transaction_dto(created),
            "Transaction created successfully",
        )),
    ))
}

/// List transactions by date, newest first, with their category
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<Vec<TransactionDto>>),
        (status = 400, description = "Invalid limit", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_transactions(
    Valid(Query(query)): Valid<Query<TransactionQuery>>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<TransactionDto>>>> {
    trace!("Entering get_transactions function");
    debug!("Listing transactions with limit: {:?}", query.limit);

    let transactions = state
        .store
        .list_transactions(current.user.id, query.limit)
        .await?;
    info!("Retrieved {} transactions", transactions.len());

    let data = transactions.into_iter().map(transaction_dto).collect();
    Ok(Json(ApiResponse::ok(
        data,
        "Transactions retrieved successfully",
    )))
}

/// Update a transaction
#[utoipa::path(
    put,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = Uuid, Path, description = "Transaction ID"),
    ),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated successfully", body = ApiResponse<TransactionDto>),
        (status = 400, description = "Invalid request or category", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn update_transaction(
    Path(transaction_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<UpdateTransactionRequest>>,
) -> ApiResult<Json<ApiResponse<TransactionDto>>> {
    trace!(
        "Entering update_transaction function for transaction_id: {}",
        transaction_id
    );

    let patch = TransactionPatch {
        description: request.description.map(|d| d.trim().to_string()),
        amount: request.amount,
        kind: request.kind.map(transaction_kind_from_dto),
        category_id: request.category_id,
        date: request.date,
    };
    let updated = state
        .store
        .update_transaction(current.user.id, transaction_id, patch)
        .await?;

    info!("Transaction {} updated successfully", transaction_id);
    Ok(Json(ApiResponse::ok(
        transaction_dto(updated),
        "Transaction updated successfully",
    )))
}

/// Delete a transaction
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{transaction_id}",
    tag = "transactions",
    params(
        ("transaction_id" = Uuid, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn delete_transaction(
    Path(transaction_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!(
        "Entering delete_transaction function for transaction_id: {}",
        transaction_id
    );

    state
        .store
        .delete_transaction(current.user.id, transaction_id)
        .await?;

    info!("Transaction {} deleted successfully", transaction_id);
    Ok(Json(ApiResponse::ok(
        format!("Transaction {} deleted", transaction_id),
        "Transaction deleted successfully",
    )))
}
