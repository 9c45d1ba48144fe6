use super::handlers::{add_staff_message, update_ticket};
use crate::auth::middleware::staff_auth;
use axum::{
    Router, middleware,
    routing::{patch, post},
};

pub fn staff_router() -> Router {
    Router::new()
        .route("/staff/tickets/{id}", patch(update_ticket))
        .route("/staff/tickets/{id}/messages", post(add_staff_message))
        .route_layer(middleware::from_fn(staff_auth))
}
