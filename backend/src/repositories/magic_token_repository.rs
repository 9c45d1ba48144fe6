//! Database repository for magic-link and password-reset tokens.
//!
//! Tokens are never deleted; redemption only stamps `used_at`.

use crate::database::models::{CreateMagicLinkToken, MagicLinkToken, TokenPurpose};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct MagicTokenRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> MagicTokenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a freshly issued token.
    pub async fn create_token(&self, token: CreateMagicLinkToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO magic_tokens (token, email, purpose, expires_at, ip, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.purpose.to_string())
        .bind(token.expires_at)
        .bind(&token.ip)
        .bind(&token.user_agent)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Looks a token up by value and purpose.
    pub async fn get_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<MagicLinkToken>> {
        let record = sqlx::query_as::<_, MagicLinkToken>(
            r#"
            SELECT email, expires_at, used_at
            FROM magic_tokens
            WHERE token = ? AND purpose = ?
            "#,
        )
        .bind(token)
        .bind(purpose.to_string())
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Marks a token as used.
    ///
    /// # Returns
    /// `true` only for the single caller that flipped `used_at` from NULL;
    /// every concurrent or later attempt gets `false`.
    pub async fn mark_used(&self, token: &str, used_at: DateTime<Utc>) -> Result<bool> {
        let rows = sqlx::query(
            "UPDATE magic_tokens SET used_at = ? WHERE token = ? AND used_at IS NULL",
        )
        .bind(used_at)
        .bind(token)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::Duration;

    fn new_token(value: &str, purpose: TokenPurpose) -> CreateMagicLinkToken {
        CreateMagicLinkToken {
            token: value.to_string(),
            email: "client@example.com".to_string(),
            purpose,
            expires_at: Utc::now() + Duration::minutes(15),
            ip: "127.0.0.1".to_string(),
            user_agent: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mark_used_succeeds_once() {
        let pool = test_pool().await;
        let repo = MagicTokenRepository::new(&pool);
        repo.create_token(new_token("abc", TokenPurpose::Login)).await.unwrap();

        assert!(repo.mark_used("abc", Utc::now()).await.unwrap());
        assert!(!repo.mark_used("abc", Utc::now()).await.unwrap());

        let stored = repo.get_token("abc", TokenPurpose::Login).await.unwrap().unwrap();
        assert!(stored.used_at.is_some());
        assert_eq!(stored.email, "client@example.com");
        assert!(!stored.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_lookup_is_scoped_by_purpose() {
        let pool = test_pool().await;
        let repo = MagicTokenRepository::new(&pool);
        repo.create_token(new_token("reset-me", TokenPurpose::Reset)).await.unwrap();

        assert!(repo.get_token("reset-me", TokenPurpose::Login).await.unwrap().is_none());
        assert!(repo.get_token("reset-me", TokenPurpose::Reset).await.unwrap().is_some());
    }
}
