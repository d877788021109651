use crate::auth::CurrentUser;
use crate::backend::{CategoryPatch, NewCategory};
use crate::error::ApiResult;
use crate::helpers::converters::{category_dto, category_kind_from_dto};
use crate::helpers::validate_not_blank;
use crate::schemas::{ApiResponse, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CategoryDto, CategoryKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for listing categories
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CategoryQuery {
    /// Categories usable for this kind of entry; `both` categories are always included
    #[serde(rename = "type")]
    pub kind: Option<CategoryKind>,
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    /// Unique per user
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
}

/// Request body for updating a category
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<CategoryKind>,
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "A category with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<CreateCategoryRequest>>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CategoryDto>>)> {
    trace!("Entering create_category function");
    debug!("Creating {:?} category '{}'", request.kind, request.name);

    let created = state
        .store
        .create_category(
            current.user.id,
            NewCategory {
                name: request.name.trim().to_string(),
                kind: category_kind_from_dto(request.kind),
            },
        )
        .await?;

    info!("Category created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(category_dto(created), "Category created successfully")),
    ))
}

/// List categories ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    params(CategoryQuery),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<Vec<CategoryDto>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_categories(
    Query(query): Query<CategoryQuery>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<CategoryDto>>>> {
    trace!("Entering get_categories function");

    let categories = state
        .store
        .list_categories(current.user.id, query.kind.map(category_kind_from_dto))
        .await?;
    info!("Retrieved {} categories", categories.len());

    let data = categories.into_iter().map(category_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Categories retrieved successfully")))
}

/// Get one category
#[utoipa::path(
    get,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = Uuid, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn get_category(
    Path(category_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<CategoryDto>>> {
    trace!("Entering get_category function for category_id: {}", category_id);

    let category = state.store.get_category(current.user.id, category_id).await?;
    Ok(Json(ApiResponse::ok(
        category_dto(category),
        "Category retrieved successfully",
    )))
}

/// Rename a category or change its type
#[utoipa::path(
    put,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = Uuid, Path, description = "Category ID"),
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryDto>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "A category with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn update_category(
    Path(category_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
    Valid(Json(request)): Valid<Json<UpdateCategoryRequest>>,
) -> ApiResult<Json<ApiResponse<CategoryDto>>> {
    trace!("Entering update_category function for category_id: {}", category_id);

    let patch = CategoryPatch {
        name: request.name.map(|n| n.trim().to_string()),
        kind: request.kind.map(category_kind_from_dto),
    };
    let updated = state
        .store
        .update_category(current.user.id, category_id, patch)
        .await?;

    info!("Category {} updated successfully", updated.id);
    Ok(Json(ApiResponse::ok(
        category_dto(updated),
        "Category updated successfully",
    )))
}

/// Delete a category; linked expenses and transactions keep existing without it
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{category_id}",
    tag = "categories",
    params(
        ("category_id" = Uuid, Path, description = "Category ID"),
    ),
    responses(
        (status = 200, description = "Category deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn delete_category(
    Path(category_id): Path<Uuid>,
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_category function for category_id: {}", category_id);

    state
        .store
        .delete_category(current.user.id, category_id)
        .await?;

    info!("Category {} deleted successfully", category_id);
    Ok(Json(ApiResponse::ok(
        format!("Category {} deleted", category_id),
        "Category deleted successfully",
    )))
}
