//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use database::mongodb::bson_ext::{datetime_from_bson, datetime_to_bson, uuid_bson, uuid_from_bson, uuid_to_bson};
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc},
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{DevicePlatform, User, UserFilter};
use crate::repository::UserRepository;

pub const USERS_COLLECTION: &str = "users";

/// Stored shape of a user.
///
/// Public so other domains reading the users collection decode the same fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: bson::Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub push_platform: Option<String>,
    #[serde(default)]
    pub push_token_updated_at: Option<bson::DateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

fn default_active() -> bool {
    true
}

impl UserDocument {
    /// Unknown platform strings decode as `None`.
    pub fn platform(&self) -> Option<DevicePlatform> {
        self.push_platform
            .as_deref()
            .and_then(|p| DevicePlatform::from_str(p).ok())
    }

    pub fn user_id(&self) -> Uuid {
        uuid_from_bson(self.id)
    }
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        Self {
            id: uuid_to_bson(user.id),
            name: user.name.clone(),
            email: user.email.clone(),
            push_token: user.push_token.clone(),
            push_platform: user.push_platform.map(|p| p.to_string()),
            push_token_updated_at: user.push_token_updated_at.map(datetime_to_bson),
            is_active: user.is_active,
            created_at: datetime_to_bson(user.created_at),
            updated_at: datetime_to_bson(user.updated_at),
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.user_id(),
            push_platform: doc.platform(),
            name: doc.name,
            email: doc.email,
            push_token: doc.push_token,
            push_token_updated_at: doc.push_token_updated_at.map(datetime_from_bson),
            is_active: doc.is_active,
            created_at: datetime_from_bson(doc.created_at),
            updated_at: datetime_from_bson(doc.updated_at),
        }
    }
}

pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    pub fn new(db: Database) -> Self {
        Self {
            collection: db.collection::<UserDocument>(USERS_COLLECTION),
        }
    }

    /// Unique email, plus a sparse index on `push_token` for token lookups.
    pub async fn create_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "push_token": 1 })
                .options(IndexOptions::builder().sparse(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "is_active": 1, "created_at": -1 })
                .build(),
        ];
        self.collection.create_indexes(indexes).await?;
        Ok(())
    }

    fn build_filter(filter: &UserFilter) -> Document {
        let mut doc = doc! {};

        if let Some(active) = filter.is_active {
            doc.insert("is_active", active);
        }

        match filter.has_push_token {
            Some(true) => {
                doc.insert("push_token", doc! { "$nin": [Bson::Null, ""] });
            }
            Some(false) => {
                doc.insert("push_token", doc! { "$in": [Bson::Null, ""] });
            }
            None => {}
        }

        doc
    }

    async fn update_by_id(&self, id: Uuid, update: Document) -> UserResult<Option<User>> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": uuid_bson(id) }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(User::from))
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn create(&self, user: User) -> UserResult<User> {
        match self.collection.insert_one(UserDocument::from(&user)).await {
            Ok(_) => {
                tracing::info!(user_id = %user.id, "user created");
                Ok(user)
            }
            Err(e) if axum_helpers::errors::is_duplicate_key(&e) => {
                Err(UserError::DuplicateEmail(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let doc = self.collection.find_one(doc! { "_id": uuid_bson(id) }).await?;
        Ok(doc.map(User::from))
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let count = self
            .collection
            .count_documents(doc! { "email": email.trim().to_lowercase() })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, id: Uuid, active: bool) -> UserResult<Option<User>> {
        self.update_by_id(
            id,
            doc! { "$set": { "is_active": active, "updated_at": bson::DateTime::now() } },
        )
        .await
    }

    #[instrument(skip(self, token))]
    async fn register_push_token(
        &self,
        id: Uuid,
        token: String,
        platform: DevicePlatform,
    ) -> UserResult<Option<User>> {
        let now = bson::DateTime::now();

        let detached = self
            .collection
            .update_many(
                doc! { "push_token": token.as_str(), "_id": { "$ne": uuid_bson(id) } },
                doc! { "$set": {
                    "push_token": Bson::Null,
                    "push_platform": Bson::Null,
                    "push_token_updated_at": now,
                    "updated_at": now,
                } },
            )
            .await?;
        if detached.modified_count > 0 {
            tracing::info!(
                user_id = %id,
                previous_owners = detached.modified_count,
                "push token moved from another user"
            );
        }

        self.update_by_id(
            id,
            doc! { "$set": {
                "push_token": token,
                "push_platform": platform.to_string(),
                "push_token_updated_at": now,
                "updated_at": now,
            } },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn clear_push_token(&self, id: Uuid) -> UserResult<Option<User>> {
        let now = bson::DateTime::now();
        self.update_by_id(
            id,
            doc! { "$set": {
                "push_token": Bson::Null,
                "push_platform": Bson::Null,
                "push_token_updated_at": now,
                "updated_at": now,
            } },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_empty() {
        assert!(MongoUserRepository::build_filter(&UserFilter::default()).is_empty());
    }

    #[test]
    fn test_build_filter_active_with_token() {
        let filter = UserFilter {
            is_active: Some(true),
            has_push_token: Some(true),
            ..Default::default()
        };
        let doc = MongoUserRepository::build_filter(&filter);
        assert_eq!(doc.get_bool("is_active").unwrap(), true);
        assert!(doc.get_document("push_token").unwrap().contains_key("$nin"));
    }

    #[test]
    fn test_document_conversion_keeps_fields() {
        let mut user = User::new("Esther".into(), "esther@example.org".into());
        user.push_token = Some("tok".into());
        user.push_platform = Some(DevicePlatform::Android);

        let back = User::from(UserDocument::from(&user));
        assert_eq!(back.id, user.id);
        assert_eq!(back.push_token.as_deref(), Some("tok"));
        assert_eq!(back.push_platform, Some(DevicePlatform::Android));
        assert_eq!(back.created_at.timestamp_millis(), user.created_at.timestamp_millis());
    }

    #[test]
    fn test_unknown_platform_decodes_as_none() {
        let mut doc = UserDocument::from(&User::new("Eli".into(), "eli@example.org".into()));
        doc.push_platform = Some("symbian".into());
        assert_eq!(doc.platform(), None);
    }
}
