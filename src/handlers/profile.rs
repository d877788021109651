use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, response::Json};
use tracing::{info, instrument, trace};

/// Delete every record of the signed-in user, then the account itself
#[utoipa::path(
    delete,
    path = "/api/v1/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn delete_profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<String>>> {
    trace!("Entering delete_profile function");
    let user_id = current.user.id;

    state.store.delete_user_data(user_id).await?;
    state.auth.delete_user(user_id).await?;
    state.forget_user_sessions(user_id);

    info!("Profile of user {} deleted", user_id);
    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", user_id),
        "Profile deleted successfully",
    )))
}
