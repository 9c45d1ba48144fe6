//! Short-lived service tokens for upstream calls.
//!
//! Each upstream has its own [`ForgeProfile`]: the shared secret, the signing
//! algorithm and which identity goes into `sub`. A profile without a secret
//! forges nothing, and callers treat that as "upstream unavailable".

use super::UpstreamError;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of every forged service token.
pub const SERVICE_TOKEN_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub trait TokenSigner: Send + Sync {
    fn sign(
        &self,
        subject: &str,
        secret: &str,
        algorithm: Algorithm,
        ttl: Duration,
    ) -> Result<String, UpstreamError>;
}

/// Signs `{sub, iat, exp}` claims with `jsonwebtoken`.
pub struct JwtSigner;

impl TokenSigner for JwtSigner {
    fn sign(
        &self,
        subject: &str,
        secret: &str,
        algorithm: Algorithm,
        ttl: Duration,
    ) -> Result<String, UpstreamError> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = ServiceClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl.as_secs() as usize,
        };

        encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| UpstreamError::Signing(e.to_string()))
    }
}

/// Which identity a forged token speaks for.
#[derive(Debug, Clone)]
pub enum SubjectPolicy {
    /// The signed-in client's email.
    Caller,
    /// A fixed service identity configured for the upstream.
    Fixed(String),
}

#[derive(Debug, Clone)]
pub struct ForgeProfile {
    pub upstream: &'static str,
    pub secret: String,
    pub algorithm: Algorithm,
    pub subject: SubjectPolicy,
    pub ttl: Duration,
}

impl ForgeProfile {
    /// Tokens that speak for the signed-in client.
    pub fn caller(upstream: &'static str, secret: &str) -> Self {
        Self::with_subject(upstream, secret, SubjectPolicy::Caller)
    }

    /// Tokens that speak for a fixed service identity.
    pub fn fixed(upstream: &'static str, secret: &str, subject: &str) -> Self {
        Self::with_subject(upstream, secret, SubjectPolicy::Fixed(subject.to_string()))
    }

    fn with_subject(upstream: &'static str, secret: &str, subject: SubjectPolicy) -> Self {
        Self {
            upstream,
            secret: secret.to_string(),
            algorithm: Algorithm::HS256,
            subject,
            ttl: SERVICE_TOKEN_TTL,
        }
    }
}

#[derive(Clone)]
pub struct CredentialForge {
    profile: ForgeProfile,
    signer: Arc<dyn TokenSigner>,
}

impl CredentialForge {
    pub fn new(profile: ForgeProfile) -> Self {
        Self::with_signer(profile, Arc::new(JwtSigner))
    }

    pub fn with_signer(profile: ForgeProfile, signer: Arc<dyn TokenSigner>) -> Self {
        Self { profile, signer }
    }

    pub fn is_configured(&self) -> bool {
        let subject_known = match &self.profile.subject {
            SubjectPolicy::Caller => true,
            SubjectPolicy::Fixed(id) => !id.trim().is_empty(),
        };
        !self.profile.secret.trim().is_empty() && subject_known
    }

    /// Forges a token for `caller`, or `None` when the profile is incomplete
    /// or signing fails.
    pub fn forge(&self, caller: &str) -> Option<String> {
        match self.try_forge(caller) {
            Ok(token) => Some(token),
            Err(e @ UpstreamError::NotConfigured { .. }) => {
                tracing::debug!("{}, skipping call", e);
                None
            }
            Err(e) => {
                tracing::error!("Failed to forge {} token: {}", self.profile.upstream, e);
                None
            }
        }
    }

    fn try_forge(&self, caller: &str) -> Result<String, UpstreamError> {
        if !self.is_configured() {
            return Err(UpstreamError::NotConfigured {
                upstream: self.profile.upstream,
            });
        }

        let subject = match &self.profile.subject {
            SubjectPolicy::Caller => caller,
            SubjectPolicy::Fixed(id) => id.as_str(),
        };

        self.signer.sign(
            subject,
            &self.profile.secret,
            self.profile.algorithm,
            self.profile.ttl,
        )
    }
}
