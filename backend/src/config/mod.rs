//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! database URLs, server port, session signing keys, upstream service
//! endpoints and their shared secrets, and SMTP relay credentials.

use anyhow::{Context, Result};
use std::env;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    pub base_url_client: String,
    pub cors_origins: Vec<String>,
    /// Reverse proxies whose `X-Forwarded-For` header is believed.
    pub trusted_proxies: Vec<IpAddr>,

    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub magic_link_expire_minutes: i64,

    pub rate_limits: RateLimitConfig,

    pub upload_dir: String,
    pub max_file_size_mb: u64,
    pub max_ticket_files: usize,

    pub ledger: LedgerConfig,
    pub quoting: QuotingConfig,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
    pub smtp_from_name: String,
    pub staff_notification_email: Option<String>,
    pub staff_api_key: Option<String>,
}

/// Per-hour quotas for the rate-limited endpoints.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub magic_link_per_hour: u32,
    pub verify_per_hour: u32,
    pub login_per_hour: u32,
    pub set_password_per_hour: u32,
    pub forgot_password_per_hour: u32,
    pub ticket_create_per_hour: u32,
}

/// Ledger Service: sites and client documents. Authenticates as the caller's email.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    pub jwt_secret: String,
}

/// Quoting Service: quotes, invoices and maintenance contracts. Authenticates
/// as a fixed admin identity, or with an API key for the client-portal routes.
#[derive(Debug, Clone)]
pub struct QuotingConfig {
    pub base_url: String,
    pub public_url: String,
    pub jwt_secret: String,
    pub admin_user_id: String,
    pub client_portal_api_key: String,
}

/// SMTP settings handed to the email service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL not set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET not set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let quoting_base_url = var("QUOTING_URL", "https://quotes.example.com");
        let quoting_public_url = lookup("QUOTING_PUBLIC_URL").unwrap_or_else(|| quoting_base_url.clone());

        Ok(Config {
            database_url,
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            acquire_timeout_seconds: parse(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", 3)?,
            server_port: parse(&lookup, "SERVER_PORT", 3000)?,
            base_url_client: var("BASE_URL_CLIENT", "http://localhost:5173"),
            cors_origins: var("CORS_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            trusted_proxies: parse_list(&lookup, "TRUSTED_PROXIES")?,

            jwt_secret,
            access_token_expire_minutes: parse(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", 60)?,
            refresh_token_expire_days: parse(&lookup, "REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            magic_link_expire_minutes: parse(&lookup, "MAGIC_LINK_EXPIRE_MINUTES", 15)?,

            rate_limits: RateLimitConfig {
                magic_link_per_hour: parse(&lookup, "RATE_LIMIT_MAGIC_LINK_PER_HOUR", 5)?,
                verify_per_hour: parse(&lookup, "RATE_LIMIT_VERIFY_PER_HOUR", 10)?,
                login_per_hour: parse(&lookup, "RATE_LIMIT_LOGIN_PER_HOUR", 10)?,
                set_password_per_hour: parse(&lookup, "RATE_LIMIT_SET_PASSWORD_PER_HOUR", 5)?,
                forgot_password_per_hour: parse(&lookup, "RATE_LIMIT_FORGOT_PASSWORD_PER_HOUR", 5)?,
                ticket_create_per_hour: parse(&lookup, "RATE_LIMIT_TICKET_CREATE_PER_HOUR", 5)?,
            },

            upload_dir: var("UPLOAD_DIR", "uploads"),
            max_file_size_mb: parse(&lookup, "MAX_FILE_SIZE_MB", 5)?,
            max_ticket_files: parse(&lookup, "MAX_TICKET_FILES", 8)?,

            ledger: LedgerConfig {
                base_url: var("LEDGER_URL", "https://ledger.example.com"),
                jwt_secret: var("LEDGER_JWT_SECRET", ""),
            },
            quoting: QuotingConfig {
                base_url: quoting_base_url,
                public_url: quoting_public_url,
                jwt_secret: var("QUOTING_JWT_SECRET", ""),
                admin_user_id: var("QUOTING_ADMIN_USER_ID", ""),
                client_portal_api_key: var("QUOTING_CLIENT_PORTAL_API_KEY", ""),
            },

            smtp_host: var("SMTP_HOST", "localhost"),
            smtp_port: parse(&lookup, "SMTP_PORT", 587)?,
            smtp_username: var("SMTP_USER", ""),
            // SMTP_PASS is accepted so the file can be shared with other services
            smtp_password: lookup("SMTP_PASSWORD")
                .filter(|value| !value.is_empty())
                .or_else(|| lookup("SMTP_PASS"))
                .unwrap_or_default(),
            smtp_from: var("SMTP_FROM", "noreply@example.com"),
            smtp_from_name: var("SMTP_FROM_NAME", "Client Portal"),
            staff_notification_email: lookup("STAFF_NOTIFICATION_EMAIL").filter(|v| !v.is_empty()),
            staff_api_key: lookup("STAFF_API_KEY").filter(|v| !v.is_empty()),
        })
    }

    /// Returns the SMTP settings, or `None` when the relay credentials are missing.
    pub fn email_config(&self) -> Option<EmailConfig> {
        if self.smtp_username.is_empty() || self.smtp_password.is_empty() {
            return None;
        }

        Some(EmailConfig {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            smtp_username: self.smtp_username.clone(),
            smtp_password: self.smtp_password.clone(),
            from_email: self.smtp_from.clone(),
            from_name: self.smtp_from_name.clone(),
        })
    }

    /// Maximum accepted size of a single ticket attachment, in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize) * 1024 * 1024
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number")),
        _ => Ok(default),
    }
}

fn parse_list<T, F>(lookup: &F, key: &str) -> Result<Vec<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .map_err(|_| anyhow::anyhow!("{key} contains an invalid entry: {item}"))
        })
        .collect()
}
