//! In-memory fakes of the public traits, shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_helpers::auth::ApiKeyVerifier;
use axum_helpers::{Authenticator, CredentialVerifier};
use domain_notifications::*;
use domain_users::DevicePlatform;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const API_KEY: &str = "sexton-test-key";

pub fn authenticator() -> Arc<dyn CredentialVerifier> {
    Arc::new(Authenticator::new(
        ApiKeyVerifier::new(&[API_KEY.to_string()]),
        None,
    ))
}

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: Uuid,
    pub token: Option<String>,
    pub platform: Option<DevicePlatform>,
    pub active: bool,
}

impl FakeUser {
    pub fn with_token(token: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            token: Some(token.to_string()),
            platform: Some(DevicePlatform::Android),
            active: true,
        }
    }

    pub fn without_token() -> Self {
        Self {
            id: Uuid::now_v7(),
            token: None,
            platform: None,
            active: true,
        }
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<Vec<FakeUser>>,
    pub clear_calls: AtomicUsize,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<FakeUser>) -> Self {
        Self {
            users: Mutex::new(users),
            clear_calls: AtomicUsize::new(0),
        }
    }

    pub fn token_of(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .and_then(|u| u.token.clone())
    }
}

#[async_trait]
impl AudienceDirectory for InMemoryDirectory {
    async fn find_users_with_token(&self, audience: Audience) -> NotificationResult<Vec<Target>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| match &audience.selector {
                AudienceSelector::Users(ids) => ids.contains(&u.id),
                AudienceSelector::AllActive => u.active,
            })
            .filter(|u| audience.platform.is_none() || u.platform == audience.platform)
            .filter_map(|u| {
                u.token.clone().filter(|t| !t.is_empty()).map(|token| Target {
                    user_id: u.id,
                    token,
                    platform: u.platform,
                })
            })
            .collect())
    }

    async fn clear_token(&self, user_id: Uuid, token: String) -> NotificationResult<bool> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.id == user_id && u.token.as_deref() == Some(token.as_str()))
        {
            Some(user) => {
                user.token = None;
                user.platform = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryInbox {
    pub records: Mutex<Vec<NotificationRecord>>,
}

impl InMemoryInbox {
    pub fn for_user(&self, user_id: Uuid) -> Vec<NotificationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryInbox {
    async fn insert(&self, record: NotificationRecord) -> NotificationResult<NotificationRecord> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        let mut records: Vec<NotificationRecord> = self
            .for_user(user_id)
            .into_iter()
            .filter(|r| !filter.unread_only || !r.read)
            .filter(|r| filter.notification_type.is_none_or(|t| r.notification_type == t))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64> {
        Ok(self.for_user(user_id).iter().filter(|r| !r.read).count() as u64)
    }

    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<NotificationRecord>> {
        let mut records = self.records.lock().unwrap();
        Ok(records.iter_mut().find(|r| r.id == id).map(|r| {
            if !r.read {
                r.read = true;
                r.read_at = Some(chrono::Utc::now());
            }
            r.clone()
        }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        let mut marked = 0;
        for record in self.records.lock().unwrap().iter_mut() {
            if record.user_id == user_id && !record.read {
                record.read = true;
                record.read_at = Some(chrono::Utc::now());
                marked += 1;
            }
        }
        Ok(marked)
    }
}

/// Answers per token: listed tokens fail as configured, the rest succeed.
#[derive(Default)]
pub struct ScriptedProvider {
    failures: HashMap<String, PushError>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(mut self, token: &str, error: PushError) -> Self {
        self.failures.insert(token.to_string(), error);
        self
    }

    pub fn unregistered(self, token: &str) -> Self {
        self.fail(
            token,
            PushError::InvalidToken {
                code: "UNREGISTERED".into(),
            },
        )
    }
}

#[async_trait]
impl PushProvider for ScriptedProvider {
    async fn send(&self, message: &PushMessage) -> Result<SentPush, PushError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.get(&message.token) {
            Some(error) => Err(error.clone()),
            None => Ok(SentPush {
                message_id: Some(format!("msg-{}", message.token)),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Service over shared fakes so tests can inspect them afterwards.
pub struct Harness {
    pub directory: Arc<InMemoryDirectory>,
    pub inbox: Arc<InMemoryInbox>,
    pub provider: Arc<ScriptedProvider>,
}

impl Harness {
    pub fn new(users: Vec<FakeUser>, provider: ScriptedProvider) -> Self {
        Self {
            directory: Arc::new(InMemoryDirectory::new(users)),
            inbox: Arc::new(InMemoryInbox::default()),
            provider: Arc::new(provider),
        }
    }

    pub fn service(&self) -> NotificationService<SharedDirectory, SharedInbox> {
        NotificationService::new(
            SharedDirectory(Arc::clone(&self.directory)),
            SharedInbox(Arc::clone(&self.inbox)),
            self.provider.clone(),
            authenticator(),
        )
    }
}

/// Delegates to a shared directory
pub struct SharedDirectory(pub Arc<InMemoryDirectory>);

#[async_trait]
impl AudienceDirectory for SharedDirectory {
    async fn find_users_with_token(&self, audience: Audience) -> NotificationResult<Vec<Target>> {
        self.0.find_users_with_token(audience).await
    }

    async fn clear_token(&self, user_id: Uuid, token: String) -> NotificationResult<bool> {
        self.0.clear_token(user_id, token).await
    }
}

/// Delegates to a shared inbox
pub struct SharedInbox(pub Arc<InMemoryInbox>);

#[async_trait]
impl NotificationRepository for SharedInbox {
    async fn insert(&self, record: NotificationRecord) -> NotificationResult<NotificationRecord> {
        self.0.insert(record).await
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        self.0.list_for_user(user_id, filter).await
    }

    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64> {
        self.0.count_unread(user_id).await
    }

    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<NotificationRecord>> {
        self.0.mark_read(id).await
    }

    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        self.0.mark_all_read(user_id).await
    }
}
