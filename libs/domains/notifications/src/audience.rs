//! Audience resolution: selector to distinct (user, token) targets.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::NotificationResult;
use crate::models::{Audience, AudienceSelector, Target};
use crate::repository::AudienceDirectory;

pub struct AudienceResolver<D: AudienceDirectory> {
    directory: Arc<D>,
}

impl<D: AudienceDirectory> AudienceResolver<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Targets in request order for explicit ids, directory order otherwise.
    ///
    /// Unknown ids and users without a token are dropped silently; each user
    /// appears at most once.
    #[instrument(skip(self, audience))]
    pub async fn resolve(&self, audience: Audience) -> NotificationResult<Vec<Target>> {
        let requested = match &audience.selector {
            AudienceSelector::Users(ids) => {
                let ids = dedup_ids(ids);
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            AudienceSelector::AllActive => None,
        };

        let query = Audience {
            selector: requested
                .clone()
                .map_or(AudienceSelector::AllActive, AudienceSelector::Users),
            platform: audience.platform,
        };
        let found = self.directory.find_users_with_token(query).await?;

        let mut targets = distinct_targets(found);
        if let Some(ids) = requested {
            let rank: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
            targets.retain(|t| rank.contains_key(&t.user_id));
            targets.sort_by_key(|t| rank.get(&t.user_id).copied().unwrap_or(usize::MAX));
        }

        debug!(targets = targets.len(), "audience resolved");
        Ok(targets)
    }
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// One target per user, skipping blank tokens; first occurrence wins
fn distinct_targets(found: Vec<Target>) -> Vec<Target> {
    let mut seen = HashSet::with_capacity(found.len());
    found
        .into_iter()
        .filter(|t| !t.token.trim().is_empty())
        .filter(|t| seen.insert(t.user_id))
        .collect()
}
