use chrono::{DateTime, Utc};
use domain_users::DevicePlatform;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Kind of notification; drives client-side icon and routing
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    Announcement,
    Prayer,
    Service,
    Event,
    Reminder,
    #[default]
    General,
    Welcome,
}

/// Body of `POST /api/notifications/send`
///
/// `userIds` absent means broadcast to every active user with a token.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, max = 4000, message = "body must not be empty"))]
    pub body: String,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub user_ids: Option<Vec<Uuid>>,
    /// Only devices registered with this platform
    #[serde(default)]
    pub platform: Option<DevicePlatform>,
    /// Arbitrary payload forwarded to the device and stored on the record
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

impl SendNotificationRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            notification_type,
            user_ids: None,
            platform: None,
            data: None,
        }
    }

    pub fn to_users(mut self, ids: Vec<Uuid>) -> Self {
        self.user_ids = Some(ids);
        self
    }

    pub fn audience(&self) -> Audience {
        Audience {
            selector: match &self.user_ids {
                Some(ids) => AudienceSelector::Users(ids.clone()),
                None => AudienceSelector::AllActive,
            },
            platform: self.platform,
        }
    }

    pub fn content(&self) -> NotificationContent {
        NotificationContent {
            title: self.title.trim().to_string(),
            body: self.body.trim().to_string(),
            notification_type: self.notification_type,
            data: self.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudienceSelector {
    /// Explicit recipients; the active flag is not consulted
    Users(Vec<Uuid>),
    /// Every active user with a registered token
    AllActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audience {
    pub selector: AudienceSelector,
    pub platform: Option<DevicePlatform>,
}

impl Audience {
    pub fn all_active() -> Self {
        Self {
            selector: AudienceSelector::AllActive,
            platform: None,
        }
    }

    pub fn users(ids: Vec<Uuid>) -> Self {
        Self {
            selector: AudienceSelector::Users(ids),
            platform: None,
        }
    }
}

/// One device eligible for one push attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub user_id: Uuid,
    pub token: String,
    pub platform: Option<DevicePlatform>,
}

/// What gets pushed and stored, independent of recipients
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub notification_type: NotificationType,
    pub data: Option<Value>,
}

/// Stored inbox entry, one per targeted user per send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    /// Whether the provider accepted the push
    pub push_delivered: bool,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(user_id: Uuid, content: &NotificationContent, push_delivered: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: content.title.clone(),
            body: content.body.clone(),
            notification_type: content.notification_type,
            data: content.data.clone(),
            push_delivered,
            read: false,
            read_at: None,
            received_at: now,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OutcomeKind {
    Delivered,
    InvalidToken,
    TransientError,
}

/// Result of one push attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub user_id: Uuid,
    pub token: String,
    pub result: OutcomeKind,
    /// Provider error code when the attempt failed
    pub error_code: Option<String>,
}

impl DispatchOutcome {
    pub fn delivered(target: &Target) -> Self {
        Self::new(target, OutcomeKind::Delivered, None)
    }

    pub fn new(target: &Target, result: OutcomeKind, error_code: Option<String>) -> Self {
        Self {
            user_id: target.user_id,
            token: target.token.clone(),
            result,
            error_code,
        }
    }

    pub fn is(&self, kind: OutcomeKind) -> bool {
        self.result == kind
    }
}

/// Every outcome of a dispatch, collected after all sends settled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.is(kind)).count()
    }

    pub fn delivered(&self) -> usize {
        self.count(OutcomeKind::Delivered)
    }

    pub fn failures(&self) -> usize {
        self.count(OutcomeKind::InvalidToken) + self.count(OutcomeKind::TransientError)
    }
}

/// Aggregate counts returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    pub total_targets: usize,
    pub success_count: usize,
    pub failure_count: usize,
    #[serde(rename = "storedInDB")]
    pub stored_in_db: usize,
    pub cleaned_tokens: usize,
    pub invalid_token_count: usize,
    pub transient_failure_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryStats {
    pub fn empty() -> Self {
        Self::from_report(&DispatchReport::default(), 0, 0)
    }

    pub fn from_report(report: &DispatchReport, stored_in_db: usize, cleaned_tokens: usize) -> Self {
        Self {
            total_targets: report.total(),
            success_count: report.delivered(),
            failure_count: report.failures(),
            stored_in_db,
            cleaned_tokens,
            invalid_token_count: report.count(OutcomeKind::InvalidToken),
            transient_failure_count: report.count(OutcomeKind::TransientError),
            timestamp: Utc::now(),
        }
    }

    /// Human-readable per-category lines
    pub fn breakdown(&self) -> Vec<String> {
        vec![
            format!("{} sent", self.success_count),
            format!(
                "{} failed (invalid token, auto-cleaned {})",
                self.invalid_token_count, self.cleaned_tokens
            ),
            format!("{} failed (transient, may retry)", self.transient_failure_count),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub message: String,
    pub stats: DeliveryStats,
    pub breakdown: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl SendNotificationResponse {
    pub fn from_stats(stats: DeliveryStats) -> Self {
        let message = if stats.total_targets == 0 {
            "No users with registered push tokens matched the audience".to_string()
        } else {
            format!(
                "Notification sent to {} of {} devices",
                stats.success_count, stats.total_targets
            )
        };
        Self {
            success: true,
            message,
            breakdown: stats.breakdown(),
            timestamp: stats.timestamp,
            stats,
        }
    }
}

/// Body of every failed notifications request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            unread_only: false,
            notification_type: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCount {
    pub user_id: Uuid,
    pub unread: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub user_id: Uuid,
    pub marked: u64,
}
