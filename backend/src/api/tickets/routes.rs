//! Defines the HTTP routes for client support tickets.

use super::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

/// `upload_limit` bounds the whole multipart body of a new ticket.
pub fn tickets_router(upload_limit: usize) -> Router {
    Router::new()
        .route(
            "/tickets",
            get(list_tickets)
                .post(create_ticket)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/messages", post(add_message))
        .route_layer(middleware::from_fn(jwt_auth))
}
