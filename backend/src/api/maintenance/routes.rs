//! Defines the HTTP routes for maintenance contracts.

use super::handlers::*;
use crate::auth::middleware::jwt_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn maintenance_router() -> Router {
    Router::new()
        .route("/maintenance", get(list_contracts))
        .route("/maintenance/subscribe", post(subscribe_contract))
        .route("/maintenance/invoices/{id}/pay", post(pay_invoice))
        .route("/maintenance/{id}", get(get_contract))
        .route("/maintenance/{id}/pdf", get(contract_pdf))
        .route("/maintenance/{id}/cancel", post(cancel_contract))
        .route("/maintenance/{id}/upgrade", post(upgrade_contract))
        .route_layer(middleware::from_fn(jwt_auth))
}
