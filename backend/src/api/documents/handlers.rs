//! Handler functions for client documents.
//!
//! Quoting documents are proxied (HTML preview, PDF bytes). Ledger documents
//! carry their own download link, so viewing one redirects to it after the
//! document has been found in the caller's listing.

use crate::api::common::{
    ApiError, ApiResponse, ApiResult, LinkResponse, api_error, file_response,
};
use crate::app::AppState;
use crate::database::models::ClientUser;
use crate::normalizer::{CanonicalDocument, DocumentSource};
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

fn document_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", "Document not found")
}

fn parse_source(raw: &str) -> Result<DocumentSource, ApiError> {
    raw.parse().map_err(|_| document_not_found())
}

/// Signing and payment only exist on the Quoting Service.
fn require_quoting(raw: &str) -> Result<(), ApiError> {
    match parse_source(raw)? {
        DocumentSource::Quoting => Ok(()),
        DocumentSource::Ledger => Err(document_not_found()),
    }
}

/// All visible documents of the caller, newest first.
#[axum::debug_handler]
pub async fn list_documents(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
) -> ApiResult<Vec<CanonicalDocument>> {
    let documents = state.aggregator().documents_for(&user).await;
    Ok(Json(ApiResponse::success(
        documents,
        "Documents retrieved successfully",
    )))
}

/// One visible document of the caller.
#[axum::debug_handler]
pub async fn get_document(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path((source, id)): Path<(String, String)>,
) -> ApiResult<CanonicalDocument> {
    let document = match parse_source(&source)? {
        DocumentSource::Quoting => state.quoting.get_document(&user.email, &id).await,
        DocumentSource::Ledger => state.ledger.find_document(&user.email, &id).await,
    }
    .ok_or_else(document_not_found)?;

    Ok(Json(ApiResponse::success(document, "Document retrieved successfully")))
}

async fn ledger_redirect(state: &AppState, user: &ClientUser, id: &str) -> Result<Response, ApiError> {
    let document = state
        .ledger
        .find_document(&user.email, id)
        .await
        .ok_or_else(document_not_found)?;
    if document.url.is_empty() {
        return Err(document_not_found());
    }
    Ok(Redirect::temporary(&document.url).into_response())
}

#[axum::debug_handler]
pub async fn view_document(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path((source, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    match parse_source(&source)? {
        DocumentSource::Quoting => {
            let html = state
                .quoting
                .document_preview(&user.email, &id)
                .await
                .ok_or_else(document_not_found)?;
            Ok(Html(html).into_response())
        }
        DocumentSource::Ledger => ledger_redirect(&state, &user, &id).await,
    }
}

#[axum::debug_handler]
pub async fn document_pdf(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path((source, id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    match parse_source(&source)? {
        DocumentSource::Quoting => {
            let download = state
                .quoting
                .document_pdf(&user.email, &id)
                .await
                .ok_or_else(document_not_found)?;
            Ok(file_response(download, &format!("{id}.pdf")))
        }
        DocumentSource::Ledger => ledger_redirect(&state, &user, &id).await,
    }
}

/// Public signing link of a quote. Created on the upstream the first time.
#[axum::debug_handler]
pub async fn sign_document(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path((source, id)): Path<(String, String)>,
) -> ApiResult<LinkResponse> {
    require_quoting(&source)?;
    let url = state.quoting.ensure_sign_url(&user.email, &id).await;
    if url.is_none() {
        tracing::warn!("No signing link available for document {} of {}", id, user.id);
    }
    Ok(Json(ApiResponse::success(LinkResponse { url }, "Signing link")))
}

/// Payment link of an invoice. Created on the upstream the first time.
#[axum::debug_handler]
pub async fn pay_document(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<ClientUser>,
    Path((source, id)): Path<(String, String)>,
) -> ApiResult<LinkResponse> {
    require_quoting(&source)?;
    let url = state.quoting.ensure_pay_url(&user.email, &id).await;
    if url.is_none() {
        tracing::warn!("No payment link available for document {} of {}", id, user.id);
    }
    Ok(Json(ApiResponse::success(LinkResponse { url }, "Payment link")))
}
