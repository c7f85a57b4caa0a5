//! Notifications Domain
//!
//! Push-notification dispatch with token hygiene, plus the per-user inbox.
//!
//! # Send pipeline
//!
//! ```text
//! ┌──────────────────┐
//! │ CredentialVerify │  ← rejected callers stop here, nothing is read or sent
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │ AudienceResolver │  ← explicit ids or all active users → distinct targets
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │  DispatchEngine  │  ← one push per target, concurrent, single deadline
//! └────────┬─────────┘
//!          │ delivered / invalid-token / transient
//! ┌────────▼─────────┐
//! │    Reconciler    │  ← clear invalid tokens, write inbox records
//! └────────┬─────────┘
//!          │
//!    DeliveryStats
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{
//!     handlers, providers, MongoAudienceDirectory, MongoNotificationRepository,
//!     NotificationService,
//! };
//!
//! let service = NotificationService::new(
//!     MongoAudienceDirectory::new(db.clone()),
//!     MongoNotificationRepository::new(db.clone()),
//!     providers::provider_from_env()?,
//!     authenticator,
//! );
//! let router = handlers::router(service);
//! ```

pub mod audience;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongo;
pub mod providers;
pub mod reconcile;
pub mod repository;
pub mod service;

pub use audience::AudienceResolver;
pub use dispatch::{DEFAULT_DISPATCH_TIMEOUT, DispatchEngine};
pub use error::{NotificationError, NotificationResult};
pub use models::{
    Audience, AudienceSelector, DeliveryStats, DispatchOutcome, DispatchReport, FailureResponse,
    MarkAllReadResponse, NotificationContent, NotificationFilter, NotificationRecord,
    NotificationType, OutcomeKind, SendNotificationRequest, SendNotificationResponse, Target,
    UnreadCount,
};
pub use mongo::{MongoAudienceDirectory, MongoNotificationRepository, NOTIFICATIONS_COLLECTION};
pub use providers::{FcmProvider, LoggingProvider, PushError, PushMessage, PushProvider, SentPush};
pub use reconcile::{ReconcileSummary, Reconciler};
pub use repository::{AudienceDirectory, NotificationRepository};
pub use service::NotificationService;
