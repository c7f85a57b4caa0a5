//! MongoDB integration tests for the directory and inbox.
//!
//! Run with `cargo test -p domain_notifications -- --ignored` (needs Docker).

use domain_notifications::*;
use domain_users::{DevicePlatform, MongoUserRepository, User, UserRepository};
use test_utils::{TestDataBuilder, TestMongo};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_directory_and_conditional_clear() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("directory_clear");
    let db = mongo.database(&builder.database_name());

    let users = MongoUserRepository::new(db.clone());
    users.create_indexes().await.unwrap();
    let with_token = users
        .create(User::new("Martha".into(), builder.email("martha")))
        .await
        .unwrap();
    let token = builder.push_token("martha");
    users
        .register_push_token(with_token.id, token.clone(), DevicePlatform::Android)
        .await
        .unwrap();
    let without_token = users
        .create(User::new("Mary".into(), builder.email("mary")))
        .await
        .unwrap();

    let directory = MongoAudienceDirectory::new(db.clone());
    let targets = directory
        .find_users_with_token(Audience::users(vec![with_token.id, without_token.id]))
        .await
        .unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].token, token);

    assert!(!directory.clear_token(with_token.id, "stale".into()).await.unwrap());
    assert!(directory.clear_token(with_token.id, token.clone()).await.unwrap());
    assert!(!directory.clear_token(with_token.id, token).await.unwrap());

    let broadcast = directory
        .find_users_with_token(Audience::all_active())
        .await
        .unwrap();
    assert!(broadcast.is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_inbox_read_tracking() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("inbox_read_tracking");
    let inbox = MongoNotificationRepository::new(mongo.database(&builder.database_name()));
    inbox.create_indexes().await.unwrap();

    let user_id = builder.user_id();
    let content = SendNotificationRequest::new("Choir", "Practice at 6", NotificationType::Reminder)
        .content();
    let first = inbox
        .insert(NotificationRecord::new(user_id, &content, true))
        .await
        .unwrap();
    inbox
        .insert(NotificationRecord::new(user_id, &content, false))
        .await
        .unwrap();

    assert_eq!(inbox.count_unread(user_id).await.unwrap(), 2);

    let read = inbox.mark_read(first.id).await.unwrap().unwrap();
    let read_again = inbox.mark_read(first.id).await.unwrap().unwrap();
    assert!(read.read);
    assert_eq!(
        read.read_at.map(|t| t.timestamp_millis()),
        read_again.read_at.map(|t| t.timestamp_millis())
    );

    assert_eq!(inbox.mark_all_read(user_id).await.unwrap(), 1);
    assert_eq!(inbox.count_unread(user_id).await.unwrap(), 0);

    let unread = inbox
        .list_for_user(
            user_id,
            NotificationFilter {
                unread_only: true,
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(unread.is_empty());
}
