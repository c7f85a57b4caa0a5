//! Push provider implementations.
//!
//! Every provider reports a tagged [`PushError`]; the invalid/transient
//! decision is made here, at the adapter boundary, and never re-derived.

mod fcm;
mod logging;

pub use fcm::{DEFAULT_FCM_API_URL, FcmConfig, FcmProvider, ServiceAccountKey, classify_fcm_error};
pub use logging::LoggingProvider;

use async_trait::async_trait;
use core_config::env_or_default;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{NotificationContent, Target};

/// One push, ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    /// String values only; FCM rejects anything else
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn for_target(target: &Target, content: &NotificationContent) -> Self {
        Self {
            token: target.token.clone(),
            title: content.title.clone(),
            body: content.body.clone(),
            data: data_payload(content),
        }
    }
}

/// Flatten the payload into string pairs and add the notification type.
pub fn data_payload(content: &NotificationContent) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    if let Some(serde_json::Value::Object(map)) = &content.data {
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            data.insert(key.clone(), value);
        }
    }
    data.insert("type".to_string(), content.notification_type.to_string());
    data
}

#[derive(Debug, Clone)]
pub struct SentPush {
    /// Provider message id, when one is returned
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The provider no longer recognises the token
    #[error("invalid token ({code})")]
    InvalidToken { code: String },

    /// Anything else: network, quota, auth, timeouts
    #[error("transient failure ({code}): {message}")]
    Transient { code: String, message: String },
}

impl PushError {
    pub fn transient(code: impl Into<String>, message: impl Into<String>) -> Self {
        PushError::Transient {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            PushError::InvalidToken { code } | PushError::Transient { code, .. } => code,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<SentPush, PushError>;

    fn name(&self) -> &'static str;
}

/// Build the provider selected by `PUSH_PROVIDER` (`fcm` or `log`).
pub fn provider_from_env() -> NotificationResult<Arc<dyn PushProvider>> {
    match env_or_default("PUSH_PROVIDER", "log").to_lowercase().as_str() {
        "fcm" => {
            let config = FcmConfig::from_env()?;
            Ok(Arc::new(FcmProvider::new(config)?))
        }
        "log" => Ok(Arc::new(LoggingProvider::new())),
        other => Err(NotificationError::Config(format!(
            "PUSH_PROVIDER must be 'fcm' or 'log', got '{other}'"
        ))),
    }
}

/// First 8 characters, for logs
pub(crate) fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(8) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
