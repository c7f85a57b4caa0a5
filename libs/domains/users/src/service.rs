use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, RegisterPushToken, User, UserFilter, UserResponse};
use crate::repository::UserRepository;

/// Business rules for users
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(UserError::Validation("name cannot be blank".to_string()));
        }
        let email = input.email.trim().to_lowercase();
        if self.repository.email_exists(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        let created = self.repository.create(User::new(name, email)).await?;
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or(UserError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<Vec<UserResponse>> {
        if filter.limit <= 0 || filter.limit > 500 {
            return Err(UserError::Validation("limit must be between 1 and 500".to_string()));
        }
        let users = self.repository.list(filter).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn set_active(&self, id: Uuid, active: bool) -> UserResult<UserResponse> {
        let user = self
            .repository
            .set_active(id, active)
            .await?
            .ok_or(UserError::NotFound(id))?;
        tracing::info!(user_id = %id, active, "user activation changed");
        Ok(user.into())
    }

    /// Register the device token for `id`. A token belongs to at most one user.
    #[instrument(skip(self, input), fields(platform = %input.platform))]
    pub async fn register_push_token(
        &self,
        id: Uuid,
        input: RegisterPushToken,
    ) -> UserResult<UserResponse> {
        let token = input.token.trim().to_string();
        if token.is_empty() {
            return Err(UserError::Validation("token cannot be blank".to_string()));
        }

        let user = self
            .repository
            .register_push_token(id, token, input.platform)
            .await?
            .ok_or(UserError::NotFound(id))?;
        tracing::info!(user_id = %id, "push token registered");
        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub async fn clear_push_token(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .clear_push_token(id)
            .await?
            .ok_or(UserError::NotFound(id))?;
        tracing::info!(user_id = %id, "push token cleared");
        Ok(user.into())
    }
}
