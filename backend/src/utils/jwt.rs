//! JWT token utilities for the portal's own session credentials.
//!
//! Provides access/refresh token creation and validation. These tokens are
//! unrelated to the service tokens forged for upstream calls
//! (see `connectors::forge`).

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::ServiceError;

/// Which use a session token was minted for.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Client user ID
    pub sub: String,
    /// Access or refresh
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// Access/refresh pair returned by every successful authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT token utility for creating and validating tokens
#[derive(Clone)]
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the loaded configuration
    pub fn new(config: &Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            access_ttl: Duration::minutes(config.access_token_expire_minutes),
            refresh_ttl: Duration::days(config.refresh_token_expire_days),
        }
    }

    /// Generate a token of the given kind for a user
    pub fn generate_token(&self, user_id: &str, kind: TokenKind) -> Result<String, ServiceError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {}", e)))
    }

    /// Generate an access/refresh pair
    pub fn generate_pair(&self, user_id: &str) -> Result<TokenPair, ServiceError> {
        Ok(TokenPair {
            access_token: self.generate_token(user_id, TokenKind::Access)?,
            refresh_token: self.generate_token(user_id, TokenKind::Refresh)?,
            token_type: "bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Validate a token's signature and expiry, and require the expected kind
    pub fn validate_token(&self, token: &str, expected: TokenKind) -> Result<Claims, ServiceError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| ServiceError::unauthorized(format!("Token validation failed: {}", e)))?;

        if claims.kind != expected {
            return Err(ServiceError::unauthorized("Token kind mismatch"));
        }
        if claims.sub.is_empty() {
            return Err(ServiceError::unauthorized("Token has no subject"));
        }

        Ok(claims)
    }
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}
