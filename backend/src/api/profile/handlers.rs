//! Handler functions for the client's own profile.

use crate::api::common::{ApiResponse, ApiResult, service_error_to_http};
use crate::app::AppState;
use crate::database::models::{ClientUser, UpdateProfileRequest};
use crate::services::user_service::UserService;
use axum::extract::{Extension, Json};

/// Returns the signed-in user.
#[axum::debug_handler]
pub async fn get_profile(Extension(user): Extension<ClientUser>) -> ApiResult<ClientUser> {
    Ok(Json(ApiResponse::success(user, "Profile retrieved successfully")))
}

/// Updates name and phone. Omitted or blank fields are left unchanged.
#[axum::debug_handler]
pub async fn update_profile(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<ClientUser> {
    let updated = UserService::new(&state.pool)
        .update_profile(&user.id, payload)
        .await
        .map_err(service_error_to_http)?;

    tracing::info!("Profile updated for user {}", updated.id);
    Ok(Json(ApiResponse::success(updated, "Profile updated successfully")))
}
