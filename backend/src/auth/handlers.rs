//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse request data, hand it to `auth::service` and wrap
//! the outcome in the standard response envelope.

use crate::api::common::{ApiResponse, ApiResult, service_error_to_http};
use crate::app::AppState;
use crate::auth::models::*;
use crate::utils::client_meta::ClientMeta;
use crate::utils::jwt::{Claims, TokenPair};
use axum::extract::{Extension, Json, Query};

/// Emails a sign-in link. The reply never reveals whether the address exists.
#[axum::debug_handler]
pub async fn request_magic_link(
    Extension(state): Extension<AppState>,
    meta: ClientMeta,
    Json(payload): Json<MagicLinkRequest>,
) -> ApiResult<()> {
    state
        .auth_service()
        .request_magic_link(payload, &meta)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success((), GENERIC_EMAIL_SENT)))
}

#[axum::debug_handler]
pub async fn verify_magic_link(
    Extension(state): Extension<AppState>,
    meta: ClientMeta,
    Query(query): Query<VerifyQuery>,
) -> ApiResult<AuthResponse> {
    let response = state
        .auth_service()
        .verify_magic_link(&query.token, &meta)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(response, "Signed in")))
}

#[axum::debug_handler]
pub async fn login(
    Extension(state): Extension<AppState>,
    meta: ClientMeta,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let response = state
        .auth_service()
        .login(payload, &meta)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(response, "Signed in")))
}

#[axum::debug_handler]
pub async fn set_password(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Option<Claims>>,
    meta: ClientMeta,
    Json(payload): Json<SetPasswordRequest>,
) -> ApiResult<AuthResponse> {
    let response = state
        .auth_service()
        .set_password(payload, claims.as_ref(), &meta)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(response, "Password saved")))
}

#[axum::debug_handler]
pub async fn forgot_password(
    Extension(state): Extension<AppState>,
    meta: ClientMeta,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    state
        .auth_service()
        .forgot_password(payload, &meta)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success((), GENERIC_EMAIL_SENT)))
}

#[axum::debug_handler]
pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<AuthResponse> {
    let response = state
        .auth_service()
        .reset_password(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(response, "Password updated")))
}

/// Handle token refresh request
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(state): Extension<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> ApiResult<TokenPair> {
    let tokens = state
        .auth_service()
        .refresh(payload)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(tokens, "Token refreshed")))
}

