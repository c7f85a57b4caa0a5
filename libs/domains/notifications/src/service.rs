use axum_helpers::{Caller, CallerCredential, CredentialVerifier};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::audience::AudienceResolver;
use crate::dispatch::{DEFAULT_DISPATCH_TIMEOUT, DispatchEngine};
use crate::error::{NotificationError, NotificationResult};
use crate::models::{
    DeliveryStats, MarkAllReadResponse, NotificationFilter, NotificationRecord,
    SendNotificationRequest, SendNotificationResponse, UnreadCount,
};
use crate::providers::PushProvider;
use crate::reconcile::Reconciler;
use crate::repository::{AudienceDirectory, NotificationRepository};

/// Send pipeline (authenticate, resolve, dispatch, reconcile) plus inbox reads.
pub struct NotificationService<D: AudienceDirectory, R: NotificationRepository> {
    resolver: AudienceResolver<D>,
    engine: DispatchEngine,
    reconciler: Reconciler<D, R>,
    notifications: Arc<R>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl<D: AudienceDirectory, R: NotificationRepository> NotificationService<D, R> {
    pub fn new(
        directory: D,
        notifications: R,
        provider: Arc<dyn PushProvider>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self::with_dispatch_timeout(
            directory,
            notifications,
            provider,
            verifier,
            DEFAULT_DISPATCH_TIMEOUT,
        )
    }

    pub fn with_dispatch_timeout(
        directory: D,
        notifications: R,
        provider: Arc<dyn PushProvider>,
        verifier: Arc<dyn CredentialVerifier>,
        dispatch_timeout: Duration,
    ) -> Self {
        let directory = Arc::new(directory);
        let notifications = Arc::new(notifications);
        Self {
            resolver: AudienceResolver::new(Arc::clone(&directory)),
            engine: DispatchEngine::new(provider, dispatch_timeout),
            reconciler: Reconciler::new(directory, Arc::clone(&notifications)),
            notifications,
            verifier,
        }
    }

    pub async fn authorize(&self, credential: &CallerCredential) -> NotificationResult<Caller> {
        Ok(self.verifier.verify(credential).await?)
    }

    /// Push a notification to its audience and report delivery stats.
    ///
    /// The credential is checked before anything is resolved, so a rejected
    /// caller causes no provider calls and no writes.
    #[instrument(
        skip_all,
        fields(notification_type = %request.notification_type, broadcast = request.user_ids.is_none())
    )]
    pub async fn send_notification(
        &self,
        credential: &CallerCredential,
        request: SendNotificationRequest,
    ) -> NotificationResult<SendNotificationResponse> {
        let caller = self.authorize(credential).await?;

        request.validate()?;
        let content = request.content();
        if content.title.is_empty() || content.body.is_empty() {
            return Err(NotificationError::Validation(
                "title and body must not be blank".to_string(),
            ));
        }

        let targets = self.resolver.resolve(request.audience()).await?;
        if targets.is_empty() {
            info!(caller = %caller.subject, "no targets resolved, nothing sent");
            return Ok(SendNotificationResponse::from_stats(DeliveryStats::empty()));
        }

        let report = self.engine.dispatch(&targets, &content).await;
        let summary = self.reconciler.reconcile(&report, &content).await?;

        let stats = DeliveryStats::from_report(&report, summary.stored_in_db, summary.cleaned_tokens);
        info!(
            caller = %caller.subject,
            total_targets = stats.total_targets,
            success_count = stats.success_count,
            failure_count = stats.failure_count,
            stored_in_db = stats.stored_in_db,
            cleaned_tokens = stats.cleaned_tokens,
            "notification sent"
        );
        Ok(SendNotificationResponse::from_stats(stats))
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        if filter.limit <= 0 || filter.limit > 200 {
            return Err(NotificationError::Validation(
                "limit must be between 1 and 200".to_string(),
            ));
        }
        self.notifications.list_for_user(user_id, filter).await
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> NotificationResult<UnreadCount> {
        let unread = self.notifications.count_unread(user_id).await?;
        Ok(UnreadCount { user_id, unread })
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid) -> NotificationResult<NotificationRecord> {
        self.notifications
            .mark_read(id)
            .await?
            .ok_or(NotificationError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<MarkAllReadResponse> {
        let marked = self.notifications.mark_all_read(user_id).await?;
        Ok(MarkAllReadResponse { user_id, marked })
    }
}
