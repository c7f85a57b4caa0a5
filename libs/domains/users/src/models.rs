use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Platform a push token was issued for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DevicePlatform {
    Android,
    Ios,
    Web,
}

/// User entity
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique, stored lowercase
    pub email: String,
    /// Registered device token, if any
    pub push_token: Option<String>,
    pub push_platform: Option<DevicePlatform>,
    pub push_token_updated_at: Option<DateTime<Utc>>,
    /// Inactive users never receive broadcasts
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            email: email.trim().to_lowercase(),
            push_token: None,
            push_platform: None,
            push_token_updated_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// A non-empty token is registered
    pub fn has_push_token(&self) -> bool {
        self.push_token.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// API view of a user; the raw token is never returned
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub push_token_registered: bool,
    pub push_platform: Option<DevicePlatform>,
    pub push_token_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            push_token_registered: user.has_push_token(),
            id: user.id,
            name: user.name,
            email: user.email,
            is_active: user.is_active,
            push_platform: user.push_platform,
            push_token_updated_at: user.push_token_updated_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
}

/// Body of `PUT /users/{id}/push-token`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterPushToken {
    #[validate(length(min = 1, max = 4096))]
    pub token: String,
    pub platform: DevicePlatform,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub has_push_token: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}
