//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle sign-in by email link or password, password recovery
//! and token refreshing. They are nested under `/api/v1/auth`.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{Router, middleware, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/magic-link", post(request_magic_link))
        .route("/verify", post(verify_magic_link))
        .route("/login", post(login))
        .route(
            "/set-password",
            post(set_password).layer(middleware::from_fn(optional_jwt_auth)),
        )
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/refresh", post(refresh_token))
}
