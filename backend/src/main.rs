//! Main entry point for the client portal backend.
//!
//! This file initializes logging and configuration, opens the database,
//! wires the upstream connectors and starts the Axum web server.

mod api;
mod app;
mod auth;
mod config;
mod connectors;
mod database;
mod errors;
mod normalizer;
mod repositories;
mod services;
mod utils;

use app::AppState;
use config::Config;
use connectors::transport::ReqwestTransport;
use database::Database;
use services::email_service::EmailService;
use services::rate_limit::InMemoryRateLimiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    let mailer = EmailService::from_config(&config);
    let port = config.server_port;

    let state = AppState::new(
        db.pool().clone(),
        config,
        Arc::new(ReqwestTransport::new()),
        Arc::new(InMemoryRateLimiter::default()),
        mailer,
    );
    let app = app::build_router(state);

    let bind_address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Starting client portal server on port {}", port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
