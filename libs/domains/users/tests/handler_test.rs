//! Handler tests for the users domain
//!
//! Drives the router with `oneshot` against an in-memory repository so status
//! codes and JSON shapes are checked without a database.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<User>>,
}

impl InMemoryUsers {
    fn with(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        f(user);
        Some(user.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create(&self, user: User) -> UserResult<User> {
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| filter.is_active.is_none_or(|a| u.is_active == a))
            .filter(|u| filter.has_push_token.is_none_or(|t| u.has_push_token() == t))
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> UserResult<Option<User>> {
        Ok(self.update(id, |u| u.is_active = active))
    }

    async fn register_push_token(
        &self,
        id: Uuid,
        token: String,
        platform: DevicePlatform,
    ) -> UserResult<Option<User>> {
        for user in self.users.lock().unwrap().iter_mut() {
            if user.id != id && user.push_token.as_deref() == Some(token.as_str()) {
                user.push_token = None;
                user.push_platform = None;
            }
        }
        Ok(self.update(id, |u| {
            u.push_token = Some(token);
            u.push_platform = Some(platform);
        }))
    }

    async fn clear_push_token(&self, id: Uuid) -> UserResult<Option<User>> {
        Ok(self.update(id, |u| {
            u.push_token = None;
            u.push_platform = None;
        }))
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_user_returns_201() {
    let app = handlers::router(UserService::new(InMemoryUsers::default()));

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({ "name": "Priscilla", "email": "Priscilla@Example.org" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.email, "priscilla@example.org");
    assert!(!user.push_token_registered);
}

#[tokio::test]
async fn test_create_user_validates_email() {
    let app = handlers::router(UserService::new(InMemoryUsers::default()));

    let response = app
        .oneshot(json_request("POST", "/", json!({ "name": "Aquila", "email": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_duplicate_email_is_conflict() {
    let existing = User::new("Aquila".into(), "aquila@example.org".into());
    let app = handlers::router(UserService::new(InMemoryUsers::with(vec![existing])));

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({ "name": "Aquila Again", "email": "AQUILA@example.org" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_push_token_moves_token_between_users() {
    let mut previous = User::new("Old Phone".into(), "old@example.org".into());
    previous.push_token = Some("shared-token".into());
    let next = User::new("New Phone".into(), "new@example.org".into());
    let (previous_id, next_id) = (previous.id, next.id);

    let service = UserService::new(InMemoryUsers::with(vec![previous, next]));
    let app = handlers::router(service.clone());

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/{next_id}/push-token"),
            json!({ "token": "shared-token", "platform": "ios" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["push_token_registered"], true);
    assert_eq!(body["push_platform"], "ios");
    assert!(body.get("push_token").is_none());

    let old = service.get_user(previous_id).await.unwrap();
    assert!(!old.push_token_registered);
}

#[tokio::test]
async fn test_push_token_for_unknown_user_is_404() {
    let app = handlers::router(UserService::new(InMemoryUsers::default()));

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/{}/push-token", Uuid::now_v7()),
            json!({ "token": "tok", "platform": "android" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivate_and_clear_token() {
    let mut user = User::new("Tabitha".into(), "tabitha@example.org".into());
    user.push_token = Some("t".into());
    let id = user.id;
    let app = handlers::router(UserService::new(InMemoryUsers::with(vec![user])));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{id}/deactivate"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: UserResponse = json_body(response.into_body()).await;
    assert!(!body.is_active);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/{id}/push-token"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: UserResponse = json_body(response.into_body()).await;
    assert!(!body.push_token_registered);
}

#[tokio::test]
async fn test_invalid_uuid_is_400() {
    let app = handlers::router(UserService::new(InMemoryUsers::default()));

    let response = app
        .oneshot(Request::builder().uri("/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
