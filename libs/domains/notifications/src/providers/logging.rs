//! Development provider: logs each push and reports it delivered.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{PushError, PushMessage, PushProvider, SentPush, token_prefix};

#[derive(Debug, Clone, Default)]
pub struct LoggingProvider;

impl LoggingProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushProvider for LoggingProvider {
    async fn send(&self, message: &PushMessage) -> Result<SentPush, PushError> {
        info!(
            token_prefix = token_prefix(&message.token),
            title = %message.title,
            data_keys = message.data.len(),
            "push (log provider)"
        );
        Ok(SentPush {
            message_id: Some(format!("log-{}", Uuid::now_v7())),
        })
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
