//! Core business logic for the authentication system.
//!
//! Clients sign in with single-use email links or, once they have set one,
//! a password. Every entry point that can be used to enumerate accounts or
//! spam inboxes is rate limited per caller IP.

use crate::auth::models::*;
use crate::config::Config;
use crate::database::models::{ClientUser, CreateMagicLinkToken, TokenPurpose};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::magic_token_repository::MagicTokenRepository;
use crate::repositories::user_repository::{UserRepository, normalize_email};
use crate::services::email_service::{self, EmailService};
use crate::services::rate_limit::{HOURLY, RateLimitStore};
use crate::utils::client_meta::ClientMeta;
use crate::utils::generate_random_string::generate_url_token;
use crate::utils::jwt::{Claims, JwtUtils, TokenKind, TokenPair};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use validator::Validate;

const INVALID_LINK: &str = "This link is invalid or has expired";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Authentication service for magic links, passwords and token refresh
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    config: &'a Config,
    jwt: &'a JwtUtils,
    limiter: &'a dyn RateLimitStore,
    mailer: Option<&'a EmailService>,
}

impl<'a> AuthService<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        config: &'a Config,
        jwt: &'a JwtUtils,
        limiter: &'a dyn RateLimitStore,
        mailer: Option<&'a EmailService>,
    ) -> Self {
        Self {
            pool,
            config,
            jwt,
            limiter,
            mailer,
        }
    }

    async fn check_rate(&self, scope: &str, ip: &str, limit: u32) -> ServiceResult<()> {
        if self.limiter.allow(&format!("{scope}:{ip}"), HOURLY, limit).await {
            Ok(())
        } else {
            tracing::warn!("Rate limit hit for {}:{}", scope, ip);
            Err(ServiceError::rate_limited(
                "Too many attempts. Please try again later.",
            ))
        }
    }

    /// Emails a sign-in link, creating the account on first contact.
    pub async fn request_magic_link(
        &self,
        request: MagicLinkRequest,
        meta: &ClientMeta,
    ) -> ServiceResult<()> {
        self.check_rate("magic", &meta.ip, self.config.rate_limits.magic_link_per_hour)
            .await?;
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let email = normalize_email(&request.email);
        let (user, created) = UserRepository::new(self.pool)
            .find_or_create_by_email(&email, None)
            .await?;
        if created {
            tracing::info!("Created client account {} on first magic link", user.id);
        }

        let token = self.issue_token(&email, TokenPurpose::Login, meta).await?;
        let link = format!(
            "{}/auth/callback?token={}",
            self.config.base_url_client.trim_end_matches('/'),
            token
        );

        let expire = self.config.magic_link_expire_minutes;
        let message = if created {
            email_service::welcome_email(&email, &link, expire)
        } else {
            email_service::magic_link_email(&email, &link, expire)
        };
        EmailService::deliver(self.mailer, message).await;

        Ok(())
    }

    /// Redeems a sign-in link.
    pub async fn verify_magic_link(
        &self,
        token: &str,
        meta: &ClientMeta,
    ) -> ServiceResult<AuthResponse> {
        self.check_rate("verify", &meta.ip, self.config.rate_limits.verify_per_hour)
            .await?;

        let email = self.redeem(token, TokenPurpose::Login).await?;
        let (user, _) = UserRepository::new(self.pool)
            .find_or_create_by_email(&email, None)
            .await?;

        tracing::info!("User {} signed in with a magic link", user.id);
        self.respond(user)
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        meta: &ClientMeta,
    ) -> ServiceResult<AuthResponse> {
        self.check_rate("login", &meta.ip, self.config.rate_limits.login_per_hour)
            .await?;
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let user = UserRepository::new(self.pool)
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_CREDENTIALS))?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(ServiceError::validation(
                "No password is set for this account. Sign in with an email link instead.",
            ));
        };

        let matches = verify(&request.password, password_hash)
            .map_err(|e| ServiceError::internal_error(format!("Password verification failed: {e}")))?;
        if !matches {
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        self.respond(user)
    }

    /// Sets a password. Creates the account for an unknown email; an existing
    /// account can only be changed by its own signed-in owner.
    pub async fn set_password(
        &self,
        request: SetPasswordRequest,
        caller: Option<&Claims>,
        meta: &ClientMeta,
    ) -> ServiceResult<AuthResponse> {
        self.check_rate("setpwd", &meta.ip, self.config.rate_limits.set_password_per_hour)
            .await?;
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let repo = UserRepository::new(self.pool);
        let password_hash = hash_password(&request.password)?;

        let (user, created) = repo
            .find_or_create_by_email(&request.email, Some(&password_hash))
            .await?;
        if created {
            tracing::info!("Created client account {} with a password", user.id);
            return self.respond(user);
        }

        match caller {
            None => {
                return Err(ServiceError::unauthorized(
                    "Sign in to change the password of an existing account",
                ));
            }
            Some(claims) if claims.user_id() != user.id => {
                return Err(ServiceError::permission_denied(
                    "You can only change your own password",
                ));
            }
            Some(_) => {}
        }

        repo.set_password_hash(&user.email, &password_hash).await?;
        let user = repo
            .get_user_by_id(&user.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", &user.id))?;
        self.respond(user)
    }

    /// Emails a reset link when the account exists. Silent otherwise.
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
        meta: &ClientMeta,
    ) -> ServiceResult<()> {
        self.check_rate(
            "forgot",
            &meta.ip,
            self.config.rate_limits.forgot_password_per_hour,
        )
        .await?;
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let Some(user) = UserRepository::new(self.pool)
            .get_user_by_email(&request.email)
            .await?
        else {
            tracing::info!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = self.issue_token(&user.email, TokenPurpose::Reset, meta).await?;
        let link = format!(
            "{}/reset-password?token={}",
            self.config.base_url_client.trim_end_matches('/'),
            token
        );
        EmailService::deliver(
            self.mailer,
            email_service::reset_password_email(
                &user.email,
                &link,
                self.config.magic_link_expire_minutes,
            ),
        )
        .await;

        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult<AuthResponse> {
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let email = self.redeem(&request.token, TokenPurpose::Reset).await?;
        let repo = UserRepository::new(self.pool);
        let password_hash = hash_password(&request.password)?;
        if !repo.set_password_hash(&email, &password_hash).await? {
            return Err(ServiceError::unauthorized(INVALID_LINK));
        }

        let user = repo
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_LINK))?;
        tracing::info!("Password reset for user {}", user.id);
        self.respond(user)
    }

    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<TokenPair> {
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let claims = self
            .jwt
            .validate_token(&request.refresh_token, TokenKind::Refresh)?;
        let user = UserRepository::new(self.pool)
            .get_user_by_id(claims.user_id())
            .await?
            .ok_or_else(|| ServiceError::unauthorized("User no longer exists"))?;

        self.jwt.generate_pair(&user.id)
    }

    async fn issue_token(
        &self,
        email: &str,
        purpose: TokenPurpose,
        meta: &ClientMeta,
    ) -> ServiceResult<String> {
        let token = generate_url_token(32);
        MagicTokenRepository::new(self.pool)
            .create_token(CreateMagicLinkToken {
                token: token.clone(),
                email: email.to_string(),
                purpose,
                expires_at: Utc::now() + Duration::minutes(self.config.magic_link_expire_minutes),
                ip: meta.ip.clone(),
                user_agent: meta.user_agent.clone(),
            })
            .await?;
        Ok(token)
    }

    /// Consumes a token exactly once and returns the email it was issued to.
    async fn redeem(&self, token: &str, purpose: TokenPurpose) -> ServiceResult<String> {
        let repo = MagicTokenRepository::new(self.pool);
        let now = Utc::now();

        let record = repo
            .get_token(token, purpose)
            .await?
            .ok_or_else(|| ServiceError::unauthorized(INVALID_LINK))?;
        if record.used_at.is_some() || record.is_expired_at(now) {
            return Err(ServiceError::unauthorized(INVALID_LINK));
        }
        if !repo.mark_used(token, now).await? {
            return Err(ServiceError::unauthorized(INVALID_LINK));
        }

        Ok(record.email)
    }

    fn respond(&self, user: ClientUser) -> ServiceResult<AuthResponse> {
        Ok(AuthResponse {
            tokens: self.jwt.generate_pair(&user.id)?,
            is_new_user: user.is_new(),
            user,
        })
    }
}

/// Function to hash a password before storing in database
fn hash_password(password: &str) -> ServiceResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
}
