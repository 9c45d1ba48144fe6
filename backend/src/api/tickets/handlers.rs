//! Handler functions for client support tickets.
//!
//! Tickets are always looked up together with their owner, so another
//! client's ticket is indistinguishable from a missing one.

use crate::api::common::{ApiError, ApiResponse, ApiResult, api_error, service_error_to_http};
use crate::app::AppState;
use crate::database::models::{
    ClientUser, CreateTicketRequest, SupportTicket, TicketMessageRequest, TicketSummary,
};
use crate::services::file_service::IncomingFile;
use axum::extract::{Extension, Json, Multipart, Path, multipart::MultipartError};

fn multipart_error(error: MultipartError) -> ApiError {
    api_error(error.status(), "validation_error", error.body_text())
}

/// Fields of the ticket creation form.
#[derive(Default)]
struct TicketForm {
    subject: String,
    description: String,
    site_id: Option<String>,
    files: Vec<IncomingFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<TicketForm, ApiError> {
    let mut form = TicketForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "subject" => form.subject = field.text().await.map_err(multipart_error)?,
            "description" => form.description = field.text().await.map_err(multipart_error)?,
            "site_id" => form.site_id = Some(field.text().await.map_err(multipart_error)?),
            "files" | "files[]" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !file_name.is_empty() {
                    form.files.push(IncomingFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!("Ignoring unknown form field {}", other),
        }
    }

    Ok(form)
}

#[axum::debug_handler]
pub async fn list_tickets(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
) -> ApiResult<Vec<TicketSummary>> {
    let tickets = state
        .ticket_service()
        .list_tickets(&user.id)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(tickets, "Tickets retrieved successfully")))
}

/// Opens a ticket from a multipart form with `subject`, `description`, an
/// optional `site_id` and any number of `files` parts.
#[axum::debug_handler]
pub async fn create_ticket(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    multipart: Multipart,
) -> ApiResult<SupportTicket> {
    let form = read_form(multipart).await?;
    let request = CreateTicketRequest {
        subject: form.subject,
        description: form.description,
        site_id: form.site_id,
    };

    let ticket = state
        .ticket_service()
        .create_ticket(&user, request, form.files)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(ticket, "Ticket created successfully")))
}

#[axum::debug_handler]
pub async fn get_ticket(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
) -> ApiResult<SupportTicket> {
    let ticket = state
        .ticket_service()
        .get_ticket(&user.id, &id)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(ticket, "Ticket retrieved successfully")))
}

#[axum::debug_handler]
pub async fn add_message(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path(id): Path<String>,
    Json(payload): Json<TicketMessageRequest>,
) -> ApiResult<SupportTicket> {
    let ticket = state
        .ticket_service()
        .add_client_message(&user.id, &id, payload)
        .await
        .map_err(service_error_to_http)?;
    Ok(Json(ApiResponse::success(ticket, "Message added")))
}
