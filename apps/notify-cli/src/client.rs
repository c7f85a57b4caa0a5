//! Thin HTTP client for the church API notification routes.

use domain_notifications::{
    FailureResponse, MarkAllReadResponse, NotificationFilter, NotificationRecord,
    SendNotificationRequest, SendNotificationResponse, UnreadCount,
};
use eyre::{Result, WrapErr, eyre};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const API_KEY_HEADER: &str = "x-api-key";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/notifications{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    pub async fn send(&self, request: &SendNotificationRequest) -> Result<SendNotificationResponse> {
        let builder = self.authorized(self.http.post(self.url("/send")).json(request));
        self.execute(builder).await
    }

    pub async fn inbox(&self, user_id: Uuid, filter: &NotificationFilter) -> Result<Vec<NotificationRecord>> {
        let mut query: Vec<(&str, String)> = vec![
            ("limit", filter.limit.to_string()),
            ("offset", filter.offset.to_string()),
        ];
        if filter.unread_only {
            query.push(("unread_only", "true".to_string()));
        }
        if let Some(kind) = filter.notification_type {
            query.push(("type", kind.to_string()));
        }
        let builder = self.http.get(self.url(&format!("/users/{user_id}"))).query(&query);
        self.execute(builder).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<UnreadCount> {
        let builder = self.http.get(self.url(&format!("/users/{user_id}/unread-count")));
        self.execute(builder).await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<MarkAllReadResponse> {
        let builder = self.http.post(self.url(&format!("/users/{user_id}/read-all")));
        self.execute(builder).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.wrap_err("church API unreachable")?;
        let status = response.status();
        debug!(%status, url = %response.url(), "church API responded");

        if status.is_success() {
            return response.json().await.wrap_err("unexpected response body");
        }
        Err(failure(status, response).await)
    }
}

async fn failure(status: StatusCode, response: Response) -> eyre::Report {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<FailureResponse>(&text) {
        Ok(FailureResponse { message, hint: Some(hint), .. }) => {
            eyre!("{status}: {message}\nhint: {hint}")
        }
        Ok(FailureResponse { message, .. }) => eyre!("{status}: {message}"),
        Err(_) => eyre!("{status}: {text}"),
    }
}
