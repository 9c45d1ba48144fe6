//! Defines the HTTP routes for construction sites.

use super::handlers::{get_site, list_sites};
use crate::auth::middleware::jwt_auth;
use axum::{Router, middleware, routing::get};

pub fn sites_router() -> Router {
    Router::new()
        .route("/sites", get(list_sites))
        .route("/sites/{id}", get(get_site))
        .route_layer(middleware::from_fn(jwt_auth))
}
