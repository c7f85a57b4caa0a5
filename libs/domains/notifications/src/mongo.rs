//! MongoDB implementations of the audience directory and notification inbox

use async_trait::async_trait;
use database::mongodb::bson_ext::{
    datetime_from_bson, datetime_to_bson, uuid_bson, uuid_from_bson, uuid_to_bson,
};
use domain_users::{USERS_COLLECTION, UserDocument};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc},
    options::{FindOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{
    Audience, AudienceSelector, NotificationFilter, NotificationRecord, NotificationType, Target,
};
use crate::repository::{AudienceDirectory, NotificationRepository};

pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// Reads targets from the users collection owned by `domain_users`
pub struct MongoAudienceDirectory {
    users: Collection<UserDocument>,
}

impl MongoAudienceDirectory {
    pub fn new(db: Database) -> Self {
        Self {
            users: db.collection::<UserDocument>(USERS_COLLECTION),
        }
    }

    fn build_filter(audience: &Audience) -> Document {
        let mut filter = doc! { "push_token": { "$nin": [Bson::Null, ""] } };

        match &audience.selector {
            AudienceSelector::Users(ids) => {
                let ids: Vec<Bson> = ids.iter().copied().map(uuid_bson).collect();
                filter.insert("_id", doc! { "$in": ids });
            }
            AudienceSelector::AllActive => {
                filter.insert("is_active", true);
            }
        }

        if let Some(platform) = audience.platform {
            filter.insert("push_platform", platform.to_string());
        }

        filter
    }
}

#[async_trait]
impl AudienceDirectory for MongoAudienceDirectory {
    #[instrument(skip(self, audience), fields(platform = ?audience.platform))]
    async fn find_users_with_token(&self, audience: Audience) -> NotificationResult<Vec<Target>> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();

        let cursor = self
            .users
            .find(Self::build_filter(&audience))
            .with_options(options)
            .await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let platform = doc.platform();
                let user_id = doc.user_id();
                doc.push_token.map(|token| Target {
                    user_id,
                    token,
                    platform,
                })
            })
            .collect())
    }

    #[instrument(skip(self, token))]
    async fn clear_token(&self, user_id: Uuid, token: String) -> NotificationResult<bool> {
        let now = bson::DateTime::now();
        let result = self
            .users
            .update_one(
                doc! { "_id": uuid_bson(user_id), "push_token": token },
                doc! { "$set": {
                    "push_token": Bson::Null,
                    "push_platform": Bson::Null,
                    "push_token_updated_at": now,
                    "updated_at": now,
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NotificationDocument {
    #[serde(rename = "_id")]
    id: bson::Uuid,
    user_id: bson::Uuid,
    title: String,
    body: String,
    #[serde(rename = "type")]
    notification_type: String,
    #[serde(default)]
    data: Option<Bson>,
    #[serde(default)]
    push_delivered: bool,
    #[serde(default)]
    read: bool,
    #[serde(default)]
    read_at: Option<bson::DateTime>,
    received_at: bson::DateTime,
    created_at: bson::DateTime,
}

impl TryFrom<&NotificationRecord> for NotificationDocument {
    type Error = NotificationError;

    /// Fails when the payload has no BSON form, e.g. an integer above `i64::MAX`
    fn try_from(record: &NotificationRecord) -> NotificationResult<Self> {
        let data = record
            .data
            .as_ref()
            .map(bson::to_bson)
            .transpose()
            .map_err(|e| NotificationError::Validation(format!("data payload cannot be stored: {e}")))?;

        Ok(Self {
            id: uuid_to_bson(record.id),
            user_id: uuid_to_bson(record.user_id),
            title: record.title.clone(),
            body: record.body.clone(),
            notification_type: record.notification_type.to_string(),
            data,
            push_delivered: record.push_delivered,
            read: record.read,
            read_at: record.read_at.map(datetime_to_bson),
            received_at: datetime_to_bson(record.received_at),
            created_at: datetime_to_bson(record.created_at),
        })
    }
}

impl From<NotificationDocument> for NotificationRecord {
    fn from(doc: NotificationDocument) -> Self {
        Self {
            id: uuid_from_bson(doc.id),
            user_id: uuid_from_bson(doc.user_id),
            notification_type: NotificationType::from_str(&doc.notification_type)
                .unwrap_or_default(),
            data: doc.data.map(Bson::into_relaxed_extjson),
            title: doc.title,
            body: doc.body,
            push_delivered: doc.push_delivered,
            read: doc.read,
            read_at: doc.read_at.map(datetime_from_bson),
            received_at: datetime_from_bson(doc.received_at),
            created_at: datetime_from_bson(doc.created_at),
        }
    }
}

pub struct MongoNotificationRepository {
    collection: Collection<NotificationDocument>,
}

impl MongoNotificationRepository {
    pub fn new(db: Database) -> Self {
        Self {
            collection: db.collection::<NotificationDocument>(NOTIFICATIONS_COLLECTION),
        }
    }

    /// Inbox listing and unread counts are per user, newest first.
    pub async fn create_indexes(&self) -> NotificationResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "created_at": -1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "read": 1 })
                .build(),
        ];
        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    fn build_filter(user_id: Uuid, filter: &NotificationFilter) -> Document {
        let mut doc = doc! { "user_id": uuid_bson(user_id) };
        if filter.unread_only {
            doc.insert("read", false);
        }
        if let Some(kind) = filter.notification_type {
            doc.insert("type", kind.to_string());
        }
        doc
    }
}

#[async_trait]
impl NotificationRepository for MongoNotificationRepository {
    #[instrument(skip(self, record), fields(notification_id = %record.id, user_id = %record.user_id))]
    async fn insert(&self, record: NotificationRecord) -> NotificationResult<NotificationRecord> {
        let document = NotificationDocument::try_from(&record)?;
        self.collection.insert_one(document).await?;
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: NotificationFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        let options = FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(user_id, &filter))
            .with_options(options)
            .await?;
        let docs: Vec<NotificationDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(NotificationRecord::from).collect())
    }

    #[instrument(skip(self))]
    async fn count_unread(&self, user_id: Uuid) -> NotificationResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "user_id": uuid_bson(user_id), "read": false })
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: Uuid) -> NotificationResult<Option<NotificationRecord>> {
        let filter = doc! { "_id": uuid_bson(id) };

        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": uuid_bson(id), "read": false },
                doc! { "$set": { "read": true, "read_at": bson::DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        if let Some(doc) = updated {
            return Ok(Some(doc.into()));
        }

        // Already read (original read_at kept) or missing
        let existing = self.collection.find_one(filter).await?;
        Ok(existing.map(NotificationRecord::from))
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, user_id: Uuid) -> NotificationResult<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "user_id": uuid_bson(user_id), "read": false },
                doc! { "$set": { "read": true, "read_at": bson::DateTime::now() } },
            )
            .await?;
        Ok(result.modified_count)
    }
}
