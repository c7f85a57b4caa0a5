use async_trait::async_trait;
use uuid::Uuid;

use crate::error::UserResult;
use crate::models::{DevicePlatform, User, UserFilter};

/// Persistence for users
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;

    /// Newest first
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Returns the updated user, `None` if it does not exist
    async fn set_active(&self, id: Uuid, active: bool) -> UserResult<Option<User>>;

    /// Store `token` on user `id`, detaching it from any other user first.
    ///
    /// Returns the updated user, `None` if it does not exist.
    async fn register_push_token(
        &self,
        id: Uuid,
        token: String,
        platform: DevicePlatform,
    ) -> UserResult<Option<User>>;

    /// Returns the updated user, `None` if it does not exist
    async fn clear_push_token(&self, id: Uuid) -> UserResult<Option<User>>;
}
