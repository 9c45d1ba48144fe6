//! Client profile business logic.

use crate::database::models::{ClientUser, UpdateProfileRequest};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use sqlx::SqlitePool;
use validator::Validate;

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get user by ID, returning an error if not found
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<ClientUser> {
        UserRepository::new(self.pool)
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Updates name and/or phone. Blank values are ignored rather than
    /// clearing the field.
    pub async fn update_profile(
        &self,
        id: &str,
        request: UpdateProfileRequest,
    ) -> ServiceResult<ClientUser> {
        let request = UpdateProfileRequest {
            name: clean(request.name),
            phone: clean(request.phone),
        };
        request.validate().map_err(ServiceError::from_validation_errors)?;

        UserRepository::new(self.pool)
            .update_profile(id, request.name.as_deref(), request.phone.as_deref())
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    #[tokio::test]
    async fn test_update_profile_completes_onboarding() {
        let pool = test_pool().await;
        let (user, _) = UserRepository::new(&pool)
            .find_or_create_by_email("a@b.fr", None)
            .await
            .unwrap();
        assert!(user.is_new());

        let service = UserService::new(&pool);
        let updated = service
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    name: Some("  Jane Roe ".to_string()),
                    phone: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name.as_deref(), Some("Jane Roe"));
        assert!(updated.phone.is_none());
        assert!(!updated.is_new());
    }

    #[tokio::test]
    async fn test_invalid_phone_is_rejected() {
        let pool = test_pool().await;
        let (user, _) = UserRepository::new(&pool)
            .find_or_create_by_email("a@b.fr", None)
            .await
            .unwrap();

        let result = UserService::new(&pool)
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    name: None,
                    phone: Some("123".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let pool = test_pool().await;
        let result = UserService::new(&pool).get_user_required("missing").await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }
}
