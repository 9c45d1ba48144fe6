//! Middleware for protecting authenticated routes.
//!
//! Bearer tokens are validated against the portal's own signing key. Only
//! access-kind tokens open the protected surface; refresh tokens are accepted
//! solely by the `/auth/refresh` endpoint.

use crate::api::common::{ApiError, api_error, service_error_to_http};
use crate::app::AppState;
use crate::services::user_service::UserService;
use crate::utils::jwt::{Claims, TokenKind};
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

pub const STAFF_KEY_HEADER: &str = "x-staff-key";

fn app_state(request: &Request) -> Result<AppState, ApiError> {
    request.extensions().get::<AppState>().cloned().ok_or_else(|| {
        tracing::error!("Application state missing from request extensions");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// JWT authentication middleware. Inserts both the `Claims` and the loaded
/// `ClientUser` into the request extensions.
pub async fn jwt_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let state = app_state(&request)?;
    let token = bearer_token(request.headers()).ok_or_else(|| {
        api_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Missing bearer token",
        )
    })?;

    let claims = state
        .jwt
        .validate_token(&token, TokenKind::Access)
        .map_err(service_error_to_http)?;

    // a valid token for a deleted account is still a 401
    let user = UserService::new(&state.pool)
        .get_user_required(claims.user_id())
        .await
        .map_err(|_| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "User no longer exists",
            )
        })?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Optional JWT authentication middleware (doesn't fail if no token)
pub async fn optional_jwt_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let state = app_state(&request)?;
    let claims: Option<Claims> = bearer_token(request.headers())
        .and_then(|token| state.jwt.validate_token(&token, TokenKind::Access).ok());

    // Always insert the Option<Claims>, even if it's None
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Guards the staff surface with a shared key. The surface is closed when no
/// key is configured.
pub async fn staff_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    let state = app_state(&request)?;
    let Some(expected) = state.config.staff_api_key.as_deref() else {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "permission_denied",
            "Staff access is disabled",
        ));
    };

    let provided = request
        .headers()
        .get(STAFF_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(expected) {
        tracing::warn!("Rejected staff request with a missing or wrong key");
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "permission_denied",
            "Invalid staff key",
        ));
    }

    Ok(next.run(request).await)
}
