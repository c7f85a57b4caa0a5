//! Firebase Cloud Messaging over the HTTP v1 API.
//!
//! Authentication uses the service-account flow: an RS256-signed assertion is
//! exchanged for an OAuth access token, which is cached until shortly before
//! it expires and shared by all concurrent sends.

use async_trait::async_trait;
use chrono::Utc;
use core_config::{env_optional, env_or_default, env_parse, env_required};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{PushError, PushMessage, PushProvider, SentPush, token_prefix};
use crate::error::{NotificationError, NotificationResult};

pub const DEFAULT_FCM_API_URL: &str = "https://fcm.googleapis.com/v1";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The JSON key file downloaded from the Firebase console.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> NotificationResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| NotificationError::Config(format!("invalid service account JSON: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    /// Base URL without trailing slash, e.g. `https://fcm.googleapis.com/v1`
    pub api_url: String,
    pub service_account: ServiceAccountKey,
    /// Per-HTTP-request timeout; the dispatch deadline still applies on top
    pub request_timeout: Duration,
}

impl FcmConfig {
    /// Uses the key's own `project_id`.
    pub fn new(service_account: ServiceAccountKey) -> NotificationResult<Self> {
        let project_id = service_account.project_id.clone().ok_or_else(|| {
            NotificationError::Config("service account has no project_id".to_string())
        })?;
        Ok(Self {
            project_id,
            api_url: DEFAULT_FCM_API_URL.to_string(),
            service_account,
            request_timeout: Duration::from_secs(10),
        })
    }

    /// Reads `FCM_SERVICE_ACCOUNT_JSON` or else the file at
    /// `FCM_SERVICE_ACCOUNT_PATH`; `FCM_PROJECT_ID` overrides the key's project.
    pub fn from_env() -> NotificationResult<Self> {
        let raw = match env_optional("FCM_SERVICE_ACCOUNT_JSON") {
            Some(json) => json,
            None => {
                let path = env_required("FCM_SERVICE_ACCOUNT_PATH")?;
                std::fs::read_to_string(&path).map_err(|e| {
                    NotificationError::Config(format!("cannot read service account {path}: {e}"))
                })?
            }
        };
        let service_account = ServiceAccountKey::from_json(&raw)?;

        let project_id = env_optional("FCM_PROJECT_ID")
            .or_else(|| service_account.project_id.clone())
            .ok_or_else(|| {
                NotificationError::Config(
                    "FCM_PROJECT_ID not set and the service account has no project_id".to_string(),
                )
            })?;

        Ok(Self {
            project_id,
            api_url: env_or_default("FCM_API_URL", DEFAULT_FCM_API_URL)
                .trim_end_matches('/')
                .to_string(),
            service_account,
            request_timeout: Duration::from_secs(env_parse("FCM_REQUEST_TIMEOUT_SECS", 10)?),
        })
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

pub struct FcmProvider {
    config: FcmConfig,
    client: Client,
    signing_key: EncodingKey,
    access_token: RwLock<Option<AccessToken>>,
}

impl FcmProvider {
    pub fn new(config: FcmConfig) -> NotificationResult<Self> {
        let signing_key = EncodingKey::from_rsa_pem(config.service_account.private_key.as_bytes())
            .map_err(|e| {
                NotificationError::Provider(format!("invalid service account private key: {e}"))
            })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| NotificationError::Provider(format!("cannot build HTTP client: {e}")))?;

        info!(
            project_id = %config.project_id,
            client_email = %config.service_account.client_email,
            "FCM provider configured"
        );

        Ok(Self {
            config,
            client,
            signing_key,
            access_token: RwLock::new(None),
        })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/projects/{}/messages:send",
            self.config.api_url, self.config.project_id
        )
    }

    async fn bearer_token(&self) -> Result<String, PushError> {
        if let Some(token) = self.access_token.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let mut cached = self.access_token.write().await;
        // Another send may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch_access_token().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_access_token(&self) -> Result<AccessToken, PushError> {
        let account = &self.config.service_account;
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &account.client_email,
            scope: FCM_SCOPE,
            aud: &account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| PushError::transient("AUTH_FAILED", e.to_string()))?;

        let response = self
            .client
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PushError::transient("AUTH_FAILED", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "FCM access token request rejected");
            return Err(PushError::transient(
                "AUTH_FAILED",
                format!("token endpoint returned {status}: {body}"),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PushError::transient("AUTH_FAILED", e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        debug!(expires_in_secs = lifetime.as_secs(), "FCM access token refreshed");

        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    async fn forget_access_token(&self) {
        *self.access_token.write().await = None;
    }
}

#[async_trait]
impl PushProvider for FcmProvider {
    async fn send(&self, message: &PushMessage) -> Result<SentPush, PushError> {
        let bearer = self.bearer_token().await?;

        let payload = json!({
            "message": {
                "token": message.token,
                "notification": { "title": message.title, "body": message.body },
                "data": message.data,
                "android": { "priority": "high" },
                "apns": { "payload": { "aps": { "sound": "default" } } },
            }
        });

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(bearer)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let message_id = response.json::<SendResponse>().await.ok().map(|r| r.name);
            debug!(token_prefix = token_prefix(&message.token), ?message_id, "FCM accepted push");
            return Ok(SentPush { message_id });
        }

        if status == StatusCode::UNAUTHORIZED {
            self.forget_access_token().await;
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_fcm_error(status, &body))
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}

fn transport_error(err: reqwest::Error) -> PushError {
    let code = if err.is_timeout() {
        "TIMEOUT"
    } else if err.is_connect() {
        "CONNECT"
    } else {
        "NETWORK"
    };
    PushError::transient(code, err.to_string())
}

#[derive(Deserialize)]
struct FcmErrorBody {
    error: FcmErrorStatus,
}

#[derive(Deserialize)]
struct FcmErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcmErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    field_violations: Vec<FieldViolation>,
}

#[derive(Deserialize)]
struct FieldViolation {
    #[serde(default)]
    field: String,
}

/// Decide whether a failed FCM response means the token is dead.
///
/// Only an explicit FCM verdict about the token counts as invalid: an
/// `UNREGISTERED` or `SENDER_ID_MISMATCH` error code, or `INVALID_ARGUMENT`
/// naming the `message.token` field. The top-level gRPC status alone never
/// does, since a wrong project or URL yields a bare `NOT_FOUND` for every send.
pub fn classify_fcm_error(status: StatusCode, body: &str) -> PushError {
    let Ok(FcmErrorBody { error }) = serde_json::from_str::<FcmErrorBody>(body) else {
        return PushError::transient(status.as_u16().to_string(), body.chars().take(200).collect::<String>());
    };

    let fcm_code = error.details.iter().find_map(|d| d.error_code.clone());
    let token_rejected = error
        .details
        .iter()
        .flat_map(|d| &d.field_violations)
        .any(|v| v.field == "message.token");

    let token_verdict = match fcm_code.as_deref() {
        Some("UNREGISTERED" | "SENDER_ID_MISMATCH") => true,
        Some("INVALID_ARGUMENT") => token_rejected,
        Some(_) => false,
        None => token_rejected && error.status.as_deref() == Some("INVALID_ARGUMENT"),
    };

    let code = fcm_code
        .or(error.status)
        .unwrap_or_else(|| status.as_u16().to_string());

    if token_verdict {
        PushError::InvalidToken { code }
    } else {
        PushError::Transient {
            code,
            message: error.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_ACCOUNT: &str = include_str!("../../tests/fixtures/service-account.json");

    fn error_body(status: &str, details: serde_json::Value) -> String {
        json!({ "error": { "code": 400, "message": "boom", "status": status, "details": details } })
            .to_string()
    }

    #[test]
    fn test_unregistered_is_invalid() {
        let body = error_body(
            "NOT_FOUND",
            json!([{ "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError", "errorCode": "UNREGISTERED" }]),
        );
        assert_eq!(
            classify_fcm_error(StatusCode::NOT_FOUND, &body),
            PushError::InvalidToken { code: "UNREGISTERED".into() }
        );
    }

    #[test]
    fn test_sender_mismatch_is_invalid() {
        let body = error_body(
            "PERMISSION_DENIED",
            json!([{ "errorCode": "SENDER_ID_MISMATCH" }]),
        );
        assert!(matches!(
            classify_fcm_error(StatusCode::FORBIDDEN, &body),
            PushError::InvalidToken { .. }
        ));
    }

    #[test]
    fn test_invalid_argument_on_token_field_is_invalid() {
        let body = error_body(
            "INVALID_ARGUMENT",
            json!([
                { "errorCode": "INVALID_ARGUMENT" },
                { "@type": "type.googleapis.com/google.rpc.BadRequest",
                  "fieldViolations": [{ "field": "message.token", "description": "Invalid registration token" }] }
            ]),
        );
        assert!(matches!(
            classify_fcm_error(StatusCode::BAD_REQUEST, &body),
            PushError::InvalidToken { .. }
        ));
    }

    #[test]
    fn test_invalid_argument_elsewhere_is_transient() {
        let body = error_body(
            "INVALID_ARGUMENT",
            json!([{ "fieldViolations": [{ "field": "message.data" }] }]),
        );
        assert!(matches!(
            classify_fcm_error(StatusCode::BAD_REQUEST, &body),
            PushError::Transient { ref code, .. } if code == "INVALID_ARGUMENT"
        ));
    }

    #[test]
    fn test_bare_not_found_is_transient() {
        // What a wrong project id or API path returns for every token
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            classify_fcm_error(StatusCode::NOT_FOUND, body),
            PushError::Transient {
                code: "NOT_FOUND".into(),
                message: "Requested entity was not found.".into(),
            }
        );
    }

    #[test]
    fn test_token_violation_without_fcm_code_is_invalid() {
        let body = error_body(
            "INVALID_ARGUMENT",
            json!([{ "fieldViolations": [{ "field": "message.token" }] }]),
        );
        assert!(matches!(
            classify_fcm_error(StatusCode::BAD_REQUEST, &body),
            PushError::InvalidToken { ref code } if code == "INVALID_ARGUMENT"
        ));
    }

    #[test]
    fn test_quota_and_outage_are_transient() {
        let body = error_body("RESOURCE_EXHAUSTED", json!([{ "errorCode": "QUOTA_EXCEEDED" }]));
        assert_eq!(
            classify_fcm_error(StatusCode::TOO_MANY_REQUESTS, &body).code(),
            "QUOTA_EXCEEDED"
        );

        let outage = classify_fcm_error(StatusCode::SERVICE_UNAVAILABLE, "<html>upstream</html>");
        assert_eq!(outage, PushError::transient("503", "<html>upstream</html>"));
    }

    #[test]
    fn test_service_account_debug_hides_key() {
        let key = ServiceAccountKey::from_json(SERVICE_ACCOUNT).unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("PRIVATE KEY"));
        assert!(printed.contains("push-sender@"));
    }

    #[test]
    fn test_config_from_env_json() {
        temp_env::with_vars(
            [
                ("FCM_SERVICE_ACCOUNT_JSON", Some(SERVICE_ACCOUNT)),
                ("FCM_SERVICE_ACCOUNT_PATH", None),
                ("FCM_PROJECT_ID", None),
                ("FCM_API_URL", Some("http://localhost:9099/v1/")),
                ("FCM_REQUEST_TIMEOUT_SECS", None),
            ],
            || {
                let config = FcmConfig::from_env().unwrap();
                assert_eq!(config.project_id, "grace-chapel-test");
                assert_eq!(config.api_url, "http://localhost:9099/v1");
                assert_eq!(config.request_timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn test_config_project_override() {
        temp_env::with_vars(
            [
                ("FCM_SERVICE_ACCOUNT_JSON", Some(SERVICE_ACCOUNT)),
                ("FCM_PROJECT_ID", Some("other-project")),
            ],
            || {
                assert_eq!(FcmConfig::from_env().unwrap().project_id, "other-project");
            },
        );
    }

    #[test]
    fn test_config_requires_credentials() {
        temp_env::with_vars_unset(["FCM_SERVICE_ACCOUNT_JSON", "FCM_SERVICE_ACCOUNT_PATH"], || {
            assert!(matches!(FcmConfig::from_env(), Err(NotificationError::Config(_))));
        });
    }

    #[test]
    fn test_provider_rejects_bad_private_key() {
        let mut key = ServiceAccountKey::from_json(SERVICE_ACCOUNT).unwrap();
        key.private_key = "not a pem".into();
        let config = FcmConfig::new(key).unwrap();
        assert!(matches!(FcmProvider::new(config), Err(NotificationError::Provider(_))));
    }

    #[test]
    fn test_send_url() {
        let config = FcmConfig::new(ServiceAccountKey::from_json(SERVICE_ACCOUNT).unwrap()).unwrap();
        let provider = FcmProvider::new(config).unwrap();
        assert_eq!(
            provider.send_url(),
            "https://fcm.googleapis.com/v1/projects/grace-chapel-test/messages:send"
        );
    }
}
