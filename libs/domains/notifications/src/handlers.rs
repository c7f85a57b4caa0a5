use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};
use axum_helpers::{
    CallerCredential, UuidPath,
    errors::responses::{BadRequestUuidResponse, InternalServerErrorResponse},
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{
    DeliveryStats, FailureResponse, MarkAllReadResponse, NotificationFilter, NotificationRecord,
    NotificationType, SendNotificationRequest, SendNotificationResponse, UnreadCount,
};
use crate::repository::{AudienceDirectory, NotificationRepository};
use crate::service::NotificationService;

#[derive(OpenApi)]
#[openapi(
    paths(
        send_notification,
        list_for_user,
        unread_count,
        mark_read,
        mark_all_read,
    ),
    components(
        schemas(
            SendNotificationRequest,
            SendNotificationResponse,
            DeliveryStats,
            FailureResponse,
            NotificationRecord,
            NotificationType,
            NotificationFilter,
            UnreadCount,
            MarkAllReadResponse
        ),
        responses(BadRequestUuidResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Notifications", description = "Push dispatch and the per-user notification inbox")
    )
)]
pub struct ApiDoc;

pub fn router<D, R>(service: NotificationService<D, R>) -> Router
where
    D: AudienceDirectory + 'static,
    R: NotificationRepository + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/send", post(send_notification))
        .route("/{id}/read", post(mark_read))
        .route("/users/{user_id}", get(list_for_user))
        .route("/users/{user_id}/unread-count", get(unread_count))
        .route("/users/{user_id}/read-all", post(mark_all_read))
        .with_state(shared_service)
}

/// Push a notification to explicit users or every active user with a device
#[utoipa::path(
    post,
    path = "/send",
    tag = "Notifications",
    request_body = SendNotificationRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Dispatched; per-category counts in stats", body = SendNotificationResponse),
        (status = 400, description = "Invalid request", body = FailureResponse),
        (status = 401, description = "Missing or invalid credential", body = FailureResponse),
        (status = 500, description = "Reconciliation failed, no stats", body = FailureResponse)
    )
)]
async fn send_notification<D: AudienceDirectory, R: NotificationRepository>(
    State(service): State<Arc<NotificationService<D, R>>>,
    credential: CallerCredential,
    body: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> NotificationResult<Json<SendNotificationResponse>> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            // A malformed body from an unknown caller is still a 401
            service.authorize(&credential).await?;
            return Err(NotificationError::Validation(rejection.body_text()));
        }
    };

    Ok(Json(service.send_notification(&credential, request).await?))
}

/// A user's notifications, newest first
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "Notifications",
    params(("user_id" = uuid::Uuid, Path, description = "User id"), NotificationFilter),
    responses(
        (status = 200, description = "Inbox page", body = Vec<NotificationRecord>),
        (status = 400, response = BadRequestUuidResponse)
    )
)]
async fn list_for_user<D: AudienceDirectory, R: NotificationRepository>(
    State(service): State<Arc<NotificationService<D, R>>>,
    UuidPath(user_id): UuidPath,
    Query(filter): Query<NotificationFilter>,
) -> NotificationResult<Json<Vec<NotificationRecord>>> {
    Ok(Json(service.list_for_user(user_id, filter).await?))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/unread-count",
    tag = "Notifications",
    params(("user_id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Unread notifications", body = UnreadCount)
    )
)]
async fn unread_count<D: AudienceDirectory, R: NotificationRepository>(
    State(service): State<Arc<NotificationService<D, R>>>,
    UuidPath(user_id): UuidPath,
) -> NotificationResult<Json<UnreadCount>> {
    Ok(Json(service.unread_count(user_id).await?))
}

/// Mark one notification read; an already-read one keeps its `read_at`
#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "Notifications",
    params(("id" = uuid::Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification", body = NotificationRecord),
        (status = 404, description = "No such notification", body = FailureResponse)
    )
)]
async fn mark_read<D: AudienceDirectory, R: NotificationRepository>(
    State(service): State<Arc<NotificationService<D, R>>>,
    UuidPath(id): UuidPath,
) -> NotificationResult<Json<NotificationRecord>> {
    Ok(Json(service.mark_read(id).await?))
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/read-all",
    tag = "Notifications",
    params(("user_id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkAllReadResponse)
    )
)]
async fn mark_all_read<D: AudienceDirectory, R: NotificationRepository>(
    State(service): State<Arc<NotificationService<D, R>>>,
    UuidPath(user_id): UuidPath,
) -> NotificationResult<Json<MarkAllReadResponse>> {
    Ok(Json(service.mark_all_read(user_id).await?))
}
