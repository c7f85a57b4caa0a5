//! Error types for the notifications domain.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, AuthError};
use core_config::ConfigError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::FailureResponse;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// Caller credential rejected; nothing was resolved or sent
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    /// The reconciliation pass as a whole failed; no stats are reported
    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Push provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for NotificationError {
    fn from(err: ConfigError) -> Self {
        NotificationError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for NotificationError {
    fn from(err: validator::ValidationErrors) -> Self {
        NotificationError::Validation(err.to_string())
    }
}

impl NotificationError {
    pub fn status(&self) -> StatusCode {
        match self {
            NotificationError::Unauthorized(AuthError::InsufficientRole) => StatusCode::FORBIDDEN,
            NotificationError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            NotificationError::Validation(_) => StatusCode::BAD_REQUEST,
            NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
            NotificationError::Provider(_) => StatusCode::BAD_GATEWAY,
            NotificationError::Reconciliation(_)
            | NotificationError::Database(_)
            | NotificationError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            NotificationError::Unauthorized(AuthError::InsufficientRole) => {
                "Sign in with an account that has the admin role"
            }
            NotificationError::Unauthorized(_) => {
                "Send a valid key in the X-API-Key header or as an Authorization bearer token"
            }
            NotificationError::Validation(_) => {
                "title and body must be non-empty; type is one of announcement, prayer, service, event, reminder, general, welcome"
            }
            NotificationError::Reconciliation(_) => {
                "Pushes may already have been delivered; check database connectivity before re-sending"
            }
            NotificationError::Database(_) => {
                "Check database connectivity; the request can be re-sent once it is back"
            }
            NotificationError::Provider(_) | NotificationError::Config(_) => {
                "Check the push provider credentials configured on the server"
            }
            NotificationError::NotFound(_) => return None,
        };
        Some(hint.to_string())
    }

    /// The database could not be reached, as opposed to one write being rejected
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            NotificationError::Database(e) => axum_helpers::errors::is_unavailable(e),
            _ => false,
        }
    }

    /// Client-facing message; internal details stay in the logs
    fn public_message(&self) -> String {
        match self {
            NotificationError::Database(_) => "Database error".to_string(),
            NotificationError::Config(_) => "Server misconfigured".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Unauthorized(e) => AppError::from(e),
            NotificationError::Validation(msg) => AppError::BadRequest(msg),
            NotificationError::NotFound(id) => {
                AppError::NotFound(format!("Notification {id} not found"))
            }
            NotificationError::Database(e) => AppError::Database(e),
            NotificationError::Provider(msg) => AppError::BadGateway(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "notification request failed");
        } else {
            tracing::info!(error = %self, "notification request rejected");
        }

        let body = FailureResponse {
            success: false,
            message: self.public_message(),
            hint: self.hint(),
        };
        (status, Json(body)).into_response()
    }
}
