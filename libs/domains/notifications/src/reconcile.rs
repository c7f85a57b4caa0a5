//! Maps dispatch outcomes back onto stored state.
//!
//! Invalid tokens are cleared from their users and inbox records are written
//! for every delivered or transiently failed target. Clears and inserts run
//! concurrently and every one of them is attempted. A failed clear or insert
//! is logged and left out of the counts; the pass only fails when the
//! database turned out to be unreachable.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{DispatchReport, NotificationContent, NotificationRecord, OutcomeKind};
use crate::providers::token_prefix;
use crate::repository::{AudienceDirectory, NotificationRepository};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub cleaned_tokens: usize,
    pub stored_in_db: usize,
}

pub struct Reconciler<D: AudienceDirectory, R: NotificationRepository> {
    directory: Arc<D>,
    notifications: Arc<R>,
}

impl<D: AudienceDirectory, R: NotificationRepository> Reconciler<D, R> {
    pub fn new(directory: Arc<D>, notifications: Arc<R>) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    #[instrument(skip_all, fields(outcomes = report.total()))]
    pub async fn reconcile(
        &self,
        report: &DispatchReport,
        content: &NotificationContent,
    ) -> NotificationResult<ReconcileSummary> {
        let (cleaned, stored) = tokio::join!(
            self.clear_invalid_tokens(report),
            self.store_records(report, content)
        );

        let summary = ReconcileSummary {
            cleaned_tokens: cleaned?,
            stored_in_db: stored?,
        };
        info!(
            cleaned_tokens = summary.cleaned_tokens,
            stored_in_db = summary.stored_in_db,
            "reconciliation complete"
        );
        Ok(summary)
    }

    async fn clear_invalid_tokens(&self, report: &DispatchReport) -> NotificationResult<usize> {
        let mut seen = HashSet::new();
        let clears = report
            .outcomes
            .iter()
            .filter(|o| o.is(OutcomeKind::InvalidToken))
            .filter(|o| seen.insert((o.user_id, o.token.as_str())))
            .map(|o| async move {
                let result = self.directory.clear_token(o.user_id, o.token.clone()).await;
                match &result {
                    Ok(true) => info!(
                        user_id = %o.user_id,
                        token_prefix = token_prefix(&o.token),
                        error_code = o.error_code.as_deref().unwrap_or_default(),
                        "invalid push token cleared"
                    ),
                    Ok(false) => {}
                    Err(e) => error!(
                        user_id = %o.user_id,
                        token_prefix = token_prefix(&o.token),
                        error = %e,
                        "clearing invalid push token failed"
                    ),
                }
                result
            });

        let results = join_all(clears).await;
        fail_if_store_unavailable("clearing invalid tokens", &results)?;
        Ok(results.iter().filter(|r| matches!(r, Ok(true))).count())
    }

    async fn store_records(
        &self,
        report: &DispatchReport,
        content: &NotificationContent,
    ) -> NotificationResult<usize> {
        let mut seen: HashSet<Uuid> = HashSet::new();
        let inserts = report
            .outcomes
            .iter()
            .filter(|o| !o.is(OutcomeKind::InvalidToken))
            .filter(|o| seen.insert(o.user_id))
            .map(|o| NotificationRecord::new(o.user_id, content, o.is(OutcomeKind::Delivered)))
            .map(|record| async move {
                let user_id = record.user_id;
                let result = self.notifications.insert(record).await;
                if let Err(e) = &result {
                    error!(%user_id, error = %e, "storing notification record failed");
                }
                result
            });

        let results = join_all(inserts).await;
        fail_if_store_unavailable("storing notification records", &results)?;
        Ok(results.iter().filter(|r| r.is_ok()).count())
    }
}

/// Per-target failures are absorbed; an unreachable database fails the pass.
fn fail_if_store_unavailable<T>(
    stage: &str,
    results: &[NotificationResult<T>],
) -> NotificationResult<()> {
    match results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .find(|e| e.is_store_unavailable())
    {
        Some(e) => Err(NotificationError::Reconciliation(format!("{stage}: {e}"))),
        None => Ok(()),
    }
}
