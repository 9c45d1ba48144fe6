//! Application state and router assembly.
//!
//! Everything a handler needs travels in one cloneable [`AppState`], injected
//! through an `Extension` layer.

use crate::api;
use crate::api::common::ApiResponse;
use crate::auth;
use crate::auth::service::AuthService;
use crate::config::Config;
use crate::connectors::ledger::LedgerClient;
use crate::connectors::quoting::QuotingClient;
use crate::connectors::transport::UpstreamTransport;
use crate::services::data_aggregator::DataAggregator;
use crate::services::email_service::EmailService;
use crate::services::file_service::AttachmentStore;
use crate::services::rate_limit::RateLimitStore;
use crate::services::ticket_service::{TicketLimits, TicketService};
use crate::utils::jwt::JwtUtils;
use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub jwt: JwtUtils,
    pub ledger: Arc<LedgerClient>,
    pub quoting: Arc<QuotingClient>,
    pub limiter: Arc<dyn RateLimitStore>,
    pub mailer: Option<Arc<EmailService>>,
    pub attachments: Arc<AttachmentStore>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        config: Config,
        transport: Arc<dyn UpstreamTransport>,
        limiter: Arc<dyn RateLimitStore>,
        mailer: Option<EmailService>,
    ) -> Self {
        Self {
            pool,
            jwt: JwtUtils::new(&config),
            ledger: Arc::new(LedgerClient::new(&config.ledger, transport.clone())),
            quoting: Arc::new(QuotingClient::new(&config.quoting, transport)),
            limiter,
            mailer: mailer.map(Arc::new),
            attachments: Arc::new(AttachmentStore::from_config(&config)),
            config: Arc::new(config),
        }
    }

    pub fn mailer(&self) -> Option<&EmailService> {
        self.mailer.as_deref()
    }

    pub fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(
            &self.pool,
            &self.config,
            &self.jwt,
            self.limiter.as_ref(),
            self.mailer(),
        )
    }

    pub fn ticket_service(&self) -> TicketService<'_> {
        TicketService::new(
            &self.pool,
            self.limiter.as_ref(),
            &self.attachments,
            self.mailer(),
            self.config.staff_notification_email.as_deref(),
            TicketLimits {
                max_files: self.config.max_ticket_files,
                per_hour: self.config.rate_limits.ticket_create_per_hour,
            },
        )
    }

    pub fn aggregator(&self) -> DataAggregator<'_> {
        DataAggregator::new(&self.pool, &self.ledger, &self.quoting)
    }
}

/// Builds the complete HTTP router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/v1/auth", auth::routes::auth_router())
        .nest("/api/v1", api::api_router(&state.config))
        .layer(ServiceBuilder::new().layer(cors).layer(Extension(state)))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root_handler() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "service": "Client Portal Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the client portal API",
    ))
}

async fn health_handler() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({"status": "ok"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::config_from;
    use crate::connectors::transport::stub::StubTransport;
    use crate::database::test_pool;
    use crate::repositories::user_repository::UserRepository;
    use crate::services::rate_limit::InMemoryRateLimiter;
    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: AppState,
        transport: Arc<StubTransport>,
        _uploads: tempfile::TempDir,
    }

    impl TestApp {
        async fn new(extra: &[(&str, &str)]) -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let upload_dir = uploads.path().to_string_lossy().to_string();
            let mut pairs = vec![
                ("DATABASE_URL", "sqlite::memory:"),
                ("JWT_SECRET", "test-secret"),
                ("UPLOAD_DIR", upload_dir.as_str()),
            ];
            pairs.extend_from_slice(extra);

            let transport = Arc::new(StubTransport::new());
            let state = AppState::new(
                test_pool().await,
                config_from(&pairs),
                transport.clone(),
                Arc::new(InMemoryRateLimiter::default()),
                None,
            );

            Self {
                router: build_router(state.clone()),
                state,
                transport,
                _uploads: uploads,
            }
        }

        async fn signed_in(&self, email: &str) -> (String, String) {
            let (user, _) = UserRepository::new(&self.state.pool)
                .find_or_create_by_email(email, None)
                .await
                .unwrap();
            let pair = self.state.jwt.generate_pair(&user.id).unwrap();
            (pair.access_token, pair.refresh_token)
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        /// Sends the request as if it arrived from `peer` over TCP.
        async fn send_from(&self, peer: [u8; 4], mut request: Request<Body>) -> StatusCode {
            request
                .extensions_mut()
                .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
            self.router.clone().oneshot(request).await.unwrap().status()
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_magic_link_is_rate_limited() {
        let app = TestApp::new(&[("RATE_LIMIT_MAGIC_LINK_PER_HOUR", "2")]).await;
        let request = || {
            json_request(
                "POST",
                "/api/v1/auth/magic-link",
                None,
                json!({"email": "client@example.com"}),
            )
        };

        let (status, body) = app.send(request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], crate::auth::models::GENERIC_EMAIL_SENT);

        assert_eq!(app.send(request()).await.0, StatusCode::OK);
        let (status, body) = app.send(request()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["error_type"], "rate_limited");
    }

    fn magic_link_from(forwarded: &str) -> Request<Body> {
        let mut request = json_request(
            "POST",
            "/api/v1/auth/magic-link",
            None,
            json!({"email": "client@example.com"}),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", forwarded.parse().unwrap());
        request
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_reset_limit() {
        let app = TestApp::new(&[("RATE_LIMIT_MAGIC_LINK_PER_HOUR", "2")]).await;

        let mut statuses = Vec::new();
        for i in 0..6 {
            let request = magic_link_from(&format!("10.0.0.{i}"));
            statuses.push(app.send_from([198, 51, 100, 9], request).await);
        }
        assert_eq!(&statuses[..2], &[StatusCode::OK, StatusCode::OK]);
        assert!(statuses[2..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_trusted_proxy_limits_each_forwarded_client() {
        let app = TestApp::new(&[
            ("RATE_LIMIT_MAGIC_LINK_PER_HOUR", "1"),
            ("TRUSTED_PROXIES", "127.0.0.1"),
        ])
        .await;
        let proxy = [127, 0, 0, 1];

        assert_eq!(app.send_from(proxy, magic_link_from("203.0.113.7")).await, StatusCode::OK);
        assert_eq!(app.send_from(proxy, magic_link_from("203.0.113.8")).await, StatusCode::OK);
        assert_eq!(
            app.send_from(proxy, magic_link_from("203.0.113.7")).await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_invalid_email_is_a_validation_error() {
        let app = TestApp::new(&[]).await;
        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/magic-link",
                None,
                json!({"email": "not-an-email"}),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_me_requires_access_token() {
        let app = TestApp::new(&[]).await;
        let (access, refresh) = app.signed_in("client@example.com").await;

        let (status, body) = app.send(get("/api/v1/me", &access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "client@example.com");
        assert!(body["data"].get("password_hash").is_none());

        assert_eq!(app.send(get("/api/v1/me", &refresh)).await.0, StatusCode::UNAUTHORIZED);

        let anonymous = Request::builder().uri("/api/v1/me").body(Body::empty()).unwrap();
        assert_eq!(app.send(anonymous).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_endpoint_rejects_access_token() {
        let app = TestApp::new(&[]).await;
        let (access, refresh) = app.signed_in("client@example.com").await;

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/refresh",
                None,
                json!({"refresh_token": refresh}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["access_token"].is_string());

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/auth/refresh",
                None,
                json!({"refresh_token": access}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_update() {
        let app = TestApp::new(&[]).await;
        let (access, _) = app.signed_in("client@example.com").await;

        let (status, body) = app
            .send(json_request(
                "PATCH",
                "/api/v1/me",
                Some(&access),
                json!({"name": "Jane Roe", "phone": "+33 6 12 34 56 78"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Jane Roe");
    }

    #[tokio::test]
    async fn test_unconfigured_upstreams_degrade_to_empty_lists() {
        let app = TestApp::new(&[]).await;
        let (access, _) = app.signed_in("client@example.com").await;

        for uri in ["/api/v1/documents", "/api/v1/sites", "/api/v1/maintenance"] {
            let (status, body) = app.send(get(uri, &access)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["data"], json!([]), "{uri}");
        }
        assert_eq!(app.transport.calls(), 0);

        let (status, _) = app.send(get("/api/v1/sites/s1", &access)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signing_is_quoting_only() {
        let app = TestApp::new(&[]).await;
        let (access, _) = app.signed_in("client@example.com").await;

        let (status, _) = app
            .send(json_request(
                "POST",
                "/api/v1/documents/ledger/d1/sign",
                Some(&access),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(json_request(
                "POST",
                "/api/v1/documents/quoting/d1/sign",
                Some(&access),
                json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["url"].is_null());
    }

    fn ticket_form(token: &str) -> Request<Body> {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"subject\"\r\n\r\n",
            "Leaking roof\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"description\"\r\n\r\n",
            "Water comes through the kitchen ceiling\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"files\"; filename=\"roof.jpg\"\r\n",
            "Content-Type: image/jpeg\r\n\r\n",
            "not-really-a-jpeg\r\n",
            "--XBOUNDARY--\r\n",
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/tickets")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ticket_flow_through_router() {
        let app = TestApp::new(&[("STAFF_API_KEY", "staff-secret")]).await;
        let (owner, _) = app.signed_in("owner@example.com").await;
        let (stranger, _) = app.signed_in("stranger@example.com").await;

        let (status, body) = app.send(ticket_form(&owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "NEW");
        assert_eq!(body["data"]["attachment_paths"].as_array().unwrap().len(), 1);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/tickets/{id}");
        assert_eq!(app.send(get(&uri, &owner)).await.0, StatusCode::OK);
        assert_eq!(app.send(get(&uri, &stranger)).await.0, StatusCode::NOT_FOUND);

        let staff_update = |key: &str| {
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/staff/tickets/{id}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-staff-key", key)
                .body(Body::from(json!({"status": "IN_PROGRESS"}).to_string()))
                .unwrap()
        };
        assert_eq!(app.send(staff_update("guess")).await.0, StatusCode::FORBIDDEN);

        let (status, body) = app.send(staff_update("staff-secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "IN_PROGRESS");
    }

    #[tokio::test]
    async fn test_staff_surface_closed_without_key() {
        let app = TestApp::new(&[]).await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/staff/tickets/t1/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-staff-key", "")
            .body(Body::from(json!({"body": "hello"}).to_string()))
            .unwrap();
        assert_eq!(app.send(request).await.0, StatusCode::FORBIDDEN);
    }
}
