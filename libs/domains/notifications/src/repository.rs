use async_trait::async_trait;
use uuid::Uuid;

use crate::error::NotificationResult;
use crate::models::{Audience, NotificationFilter, NotificationRecord, Target};

/// Read side of the users collection plus the token clear.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudienceDirectory: Send + Sync {
    /// Users matching `audience` that hold a non-empty token.
    ///
    /// Unknown ids are absent from the result rather than an error.
    async fn find_users_with_token(&self, audience: Audience) -> NotificationResult<Vec<Target>>;

    /// Clear `token` from `user_id` if it is still the stored token.
    ///
    /// Returns whether a record changed; clearing twice is a no-op.
    async fn clear_token(&self, user_id: Uuid, token: String) -> NotificationResult<bool>;
}

/// Persistence for the notification inbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, record: NotificationRecord) -> NotificationResult<NotificationRecord>;

    /// Newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<NotificationRecord>>;

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64>;

    /// Keeps the original `read_at` when already read. `None` if missing.
    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<NotificationRecord>>;

    /// Returns how many records changed
    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64>;
}
