//! Handler functions for staff ticket handling.

use crate::api::common::{ApiResponse, ApiResult, service_error_to_http};
use crate::app::AppState;
use crate::database::models::{StaffTicketUpdate, SupportTicket, TicketMessageRequest};
use axum::extract::{Extension, Json, Path};

/// Moves a ticket through its workflow and/or records a resolution.
#[axum::debug_handler]
pub async fn update_ticket(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StaffTicketUpdate>,
) -> ApiResult<SupportTicket> {
    let ticket = state
        .ticket_service()
        .staff_update(&id, payload)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(ticket, "Ticket updated")))
}

#[axum::debug_handler]
pub async fn add_staff_message(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TicketMessageRequest>,
) -> ApiResult<SupportTicket> {
    let ticket = state
        .ticket_service()
        .add_staff_message(&id, payload)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(ticket, "Message added")))
}
