//! Handler functions for construction sites.
//!
//! An unreachable Ledger Service yields an empty list rather than an error.

use crate::api::common::{ApiResponse, ApiResult, api_error};
use crate::app::AppState;
use crate::database::models::ClientUser;
use crate::normalizer::CanonicalSite;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};

#[axum::debug_handler]
pub async fn list_sites(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
) -> ApiResult<Vec<CanonicalSite>> {
    let sites = state.ledger.list_sites(&user.email).await;
    tracing::debug!("Returning {} sites for user {}", sites.len(), user.id);
    Ok(Json(ApiResponse::success(sites, "Sites retrieved successfully")))
}

#[axum::debug_handler]
pub async fn get_site(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
) -> ApiResult<CanonicalSite> {
    let site = state
        .ledger
        .get_site(&user.email, &id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "not_found", "Site not found"))?;

    Ok(Json(ApiResponse::success(site, "Site retrieved successfully")))
}
