//! Handler functions for maintenance contracts.
//!
//! Actions are forwarded to the Quoting Service; an unreachable upstream is
//! reported as `accepted: false` inside a successful response.

use super::models::{CancelContractRequest, SubscribeContractRequest, UpgradeContractRequest};
use crate::api::common::{
    ApiError, ApiResponse, ApiResult, LinkResponse, api_error, file_response,
    service_error_to_http,
};
use crate::app::AppState;
use crate::connectors::quoting::ActionOutcome;
use crate::database::models::ClientUser;
use crate::errors::ServiceError;
use crate::normalizer::MaintenanceContract;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Response,
};
use validator::Validate;

fn contract_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", "Contract not found")
}

fn validate<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload
        .validate()
        .map_err(|e| service_error_to_http(ServiceError::from_validation_errors(e)))
}

fn outcome_response(outcome: ActionOutcome) -> ApiResult<ActionOutcome> {
    let message = if outcome.accepted {
        "Request sent"
    } else {
        "The request could not be forwarded. Please try again later."
    };
    Ok(Json(ApiResponse::success(outcome, message)))
}

#[axum::debug_handler]
pub async fn list_contracts(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
) -> ApiResult<Vec<MaintenanceContract>> {
    let contracts = state.quoting.list_contracts(&user.email).await;
    Ok(Json(ApiResponse::success(
        contracts,
        "Contracts retrieved successfully",
    )))
}

#[axum::debug_handler]
pub async fn get_contract(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
) -> ApiResult<MaintenanceContract> {
    let contract = state
        .quoting
        .get_contract(&user.email, &id)
        .await
        .ok_or_else(contract_not_found)?;
    Ok(Json(ApiResponse::success(contract, "Contract retrieved successfully")))
}

#[axum::debug_handler]
pub async fn contract_pdf(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state
        .quoting
        .contract_pdf(&user.email, &id)
        .await
        .ok_or_else(contract_not_found)?;
    Ok(file_response(download, &format!("contract-{id}.pdf")))
}

#[axum::debug_handler]
pub async fn cancel_contract(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
    Json(payload): Json<CancelContractRequest>,
) -> ApiResult<ActionOutcome> {
    validate(&payload)?;
    tracing::info!("User {} requested cancellation of contract {}", user.id, id);

    let outcome = state
        .quoting
        .cancel_contract(&user.email, &id, payload.reason.trim())
        .await;
    outcome_response(outcome)
}

#[axum::debug_handler]
pub async fn upgrade_contract(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpgradeContractRequest>,
) -> ApiResult<ActionOutcome> {
    validate(&payload)?;
    tracing::info!("User {} requested upgrade of contract {} to {}", user.id, id, payload.pack);

    let outcome = state
        .quoting
        .upgrade_contract(&user.email, &id, payload.pack.trim())
        .await;
    outcome_response(outcome)
}

#[axum::debug_handler]
pub async fn subscribe_contract(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Json(payload): Json<SubscribeContractRequest>,
) -> ApiResult<ActionOutcome> {
    validate(&payload)?;
    tracing::info!("User {} requested a new {} contract", user.id, payload.pack);

    let outcome = state
        .quoting
        .subscribe_contract(&user.email, &payload.into())
        .await;
    outcome_response(outcome)
}

/// Payment link of an unpaid contract invoice.
#[axum::debug_handler]
pub async fn pay_invoice(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
) -> ApiResult<LinkResponse> {
    let url = state.quoting.ensure_invoice_pay_url(&user.email, &id).await;
    Ok(Json(ApiResponse::success(LinkResponse { url }, "Payment link")))
}
