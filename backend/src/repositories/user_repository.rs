//! Database repository for client account operations.
//!
//! Emails are stored lowercased and compared case-insensitively; they are the
//! stable join key towards the upstream services.

use crate::database::models::ClientUser;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, name, phone, password_hash, linked_external_id, created_at, updated_at";

/// Repository for client user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - Reference to SQLite connection pool
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a user for `email` unless one already exists.
    ///
    /// # Returns
    /// The stored user and whether it was created by this call.
    pub async fn find_or_create_by_email(
        &self,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<(ClientUser, bool)> {
        let now = Utc::now();
        let email = normalize_email(email);

        let inserted = sqlx::query(
            r#"
            INSERT INTO client_users (id, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7().to_string())
        .bind(&email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?
        .rows_affected()
            == 1;

        let user = self
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {email} vanished after upsert"))?;

        Ok((user, inserted))
    }

    /// Retrieves a user by their unique identifier.
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<ClientUser>> {
        let user = sqlx::query_as::<_, ClientUser>(&format!(
            "SELECT {USER_COLUMNS} FROM client_users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Retrieves a user by email, ignoring case.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<ClientUser>> {
        let user = sqlx::query_as::<_, ClientUser>(&format!(
            "SELECT {USER_COLUMNS} FROM client_users WHERE email = ?"
        ))
        .bind(normalize_email(email))
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Replaces the password hash of an existing user.
    ///
    /// # Returns
    /// `true` if a user with this email was updated
    pub async fn set_password_hash(&self, email: &str, password_hash: &str) -> Result<bool> {
        let rows = sqlx::query(
            "UPDATE client_users SET password_hash = ?, updated_at = ? WHERE email = ?",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(normalize_email(email))
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    /// Updates the editable profile fields. `None` leaves a field untouched.
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<ClientUser>> {
        sqlx::query(
            r#"
            UPDATE client_users
            SET name = COALESCE(?, name),
                phone = COALESCE(?, phone),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(phone)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        self.get_user_by_id(id).await
    }

    /// Records the upstream client identifier resolved for this user.
    pub async fn link_external_id(&self, id: &str, external_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE client_users
            SET linked_external_id = ?, updated_at = ?
            WHERE id = ? AND (linked_external_id IS NULL OR linked_external_id != ?)
            "#,
        )
        .bind(external_id)
        .bind(Utc::now())
        .bind(id)
        .bind(external_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

/// Canonical form of an email address used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    #[tokio::test]
    async fn test_find_or_create_is_case_insensitive() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);

        let (first, created) = repo.find_or_create_by_email("Jane@Example.com", None).await.unwrap();
        assert!(created);
        assert_eq!(first.email, "jane@example.com");

        let (second, created) = repo.find_or_create_by_email(" JANE@example.COM ", None).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_missing_fields() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        let (user, _) = repo.find_or_create_by_email("a@b.fr", None).await.unwrap();

        repo.update_profile(&user.id, Some("Alice"), Some("0600000000")).await.unwrap();
        let updated = repo.update_profile(&user.id, None, Some("0611111111")).await.unwrap().unwrap();

        assert_eq!(updated.name.as_deref(), Some("Alice"));
        assert_eq!(updated.phone.as_deref(), Some("0611111111"));
        assert!(!updated.is_new());
    }

    #[tokio::test]
    async fn test_set_password_hash_requires_existing_user() {
        let pool = test_pool().await;
        let repo = UserRepository::new(&pool);
        assert!(!repo.set_password_hash("ghost@b.fr", "hash").await.unwrap());

        repo.find_or_create_by_email("real@b.fr", None).await.unwrap();
        assert!(repo.set_password_hash("REAL@b.fr", "hash").await.unwrap());
        let user = repo.get_user_by_email("real@b.fr").await.unwrap().unwrap();
        assert_eq!(user.password_hash.as_deref(), Some("hash"));
    }
}
