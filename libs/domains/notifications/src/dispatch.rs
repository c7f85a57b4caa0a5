//! Concurrent push fan-out with a single deadline for the whole batch.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

use crate::models::{DispatchOutcome, DispatchReport, NotificationContent, OutcomeKind, Target};
use crate::providers::{PushError, PushMessage, PushProvider, token_prefix};

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const TIMEOUT_CODE: &str = "TIMEOUT";

pub struct DispatchEngine {
    provider: Arc<dyn PushProvider>,
    timeout: Duration,
}

impl DispatchEngine {
    pub fn new(provider: Arc<dyn PushProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Send one push per target and wait for every send to settle.
    ///
    /// Sends still running at the deadline are reported as transient. There
    /// are no retries; outcomes keep the order of `targets`.
    #[instrument(skip_all, fields(provider = self.provider.name(), targets = targets.len()))]
    pub async fn dispatch(
        &self,
        targets: &[Target],
        content: &NotificationContent,
    ) -> DispatchReport {
        let deadline = Instant::now() + self.timeout;

        let sends = targets.iter().map(|target| {
            let message = PushMessage::for_target(target, content);
            async move {
                let result = timeout_at(deadline, self.provider.send(&message)).await;
                let outcome = match result {
                    Ok(Ok(_)) => DispatchOutcome::delivered(target),
                    Ok(Err(PushError::InvalidToken { code })) => {
                        DispatchOutcome::new(target, OutcomeKind::InvalidToken, Some(code))
                    }
                    Ok(Err(PushError::Transient { code, message })) => {
                        warn!(
                            user_id = %target.user_id,
                            token_prefix = token_prefix(&target.token),
                            error_code = %code,
                            error = %message,
                            "push failed"
                        );
                        DispatchOutcome::new(target, OutcomeKind::TransientError, Some(code))
                    }
                    Err(_elapsed) => {
                        warn!(
                            user_id = %target.user_id,
                            token_prefix = token_prefix(&target.token),
                            "push timed out"
                        );
                        DispatchOutcome::new(
                            target,
                            OutcomeKind::TransientError,
                            Some(TIMEOUT_CODE.to_string()),
                        )
                    }
                };
                tracing::debug!(
                    user_id = %outcome.user_id,
                    token_prefix = token_prefix(&outcome.token),
                    outcome = %outcome.result,
                    "push settled"
                );
                outcome
            }
        });

        let report = DispatchReport {
            outcomes: join_all(sends).await,
        };

        info!(
            delivered = report.delivered(),
            invalid_tokens = report.count(OutcomeKind::InvalidToken),
            transient = report.count(OutcomeKind::TransientError),
            "dispatch settled"
        );
        report
    }
}
