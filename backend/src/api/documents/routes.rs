//! Defines the HTTP routes for client documents.

use super::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn documents_router() -> Router {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents/{source}/{id}", get(get_document))
        .route("/documents/{source}/{id}/view", get(view_document))
        .route("/documents/{source}/{id}/pdf", get(document_pdf))
        .route("/documents/{source}/{id}/sign", post(sign_document))
        .route("/documents/{source}/{id}/pay", post(pay_document))
        .route_layer(middleware::from_fn(jwt_auth))
}
