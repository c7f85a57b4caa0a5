//! Caller authentication.
//!
//! Handlers take a [`CallerCredential`] extractor, which never rejects on its
//! own: it records what the caller presented, and the service decides whether
//! the request may proceed by asking a [`CredentialVerifier`]. That keeps the
//! authorization check inside the operation it guards.
//!
//! Two credential kinds are accepted:
//! - API keys (`X-API-Key: <key>` or `Authorization: Bearer <key>`), compared by SHA-256 digest
//! - Session tokens (HS256 JWTs in `Authorization: Bearer` or the `access_token` cookie)
//!   carrying the `admin` role
//!
//! ```ignore
//! let auth = Arc::new(Authenticator::from_config(&AuthConfig::from_env()?));
//! let caller = auth.verify(&credential).await?;
//! ```

mod api_key;
mod config;
mod credential;
mod session;

pub use api_key::ApiKeyVerifier;
pub use config::AuthConfig;
pub use credential::{API_KEY_HEADER, CallerCredential};
pub use session::{ADMIN_ROLE, SessionClaims, SessionVerifier};

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No credentials provided")]
    Missing,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Invalid session token: {0}")]
    InvalidSession(String),

    #[error("Session does not carry the admin role")]
    InsufficientRole,

    #[error("Session tokens are not accepted by this server")]
    SessionsDisabled,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientRole => AppError::Forbidden(err.to_string()),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    ApiKey,
    Session,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// API key fingerprint or session subject
    pub subject: String,
    pub method: AuthMethod,
}

/// Decides whether a presented credential is acceptable.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &CallerCredential) -> Result<Caller, AuthError>;
}

/// Verifies API keys and, when configured, admin session tokens.
#[derive(Clone)]
pub struct Authenticator {
    api_keys: ApiKeyVerifier,
    sessions: Option<SessionVerifier>,
}

impl Authenticator {
    pub fn new(api_keys: ApiKeyVerifier, sessions: Option<SessionVerifier>) -> Self {
        Self { api_keys, sessions }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            ApiKeyVerifier::new(&config.api_keys),
            config.session_secret.as_deref().map(SessionVerifier::new),
        )
    }
}

#[async_trait]
impl CredentialVerifier for Authenticator {
    async fn verify(&self, credential: &CallerCredential) -> Result<Caller, AuthError> {
        let result = match credential {
            CallerCredential::Missing => Err(AuthError::Missing),
            CallerCredential::ApiKey(key) => self.api_keys.verify(key),
            CallerCredential::Bearer(token) if SessionVerifier::looks_like_jwt(token) => {
                match &self.sessions {
                    Some(sessions) => sessions.verify(token),
                    None => Err(AuthError::SessionsDisabled),
                }
            }
            CallerCredential::Bearer(key) => self.api_keys.verify(key),
            CallerCredential::SessionCookie(token) => match &self.sessions {
                Some(sessions) => sessions.verify(token),
                None => Err(AuthError::SessionsDisabled),
            },
        };

        match &result {
            Ok(caller) => tracing::debug!(subject = %caller.subject, method = ?caller.method, "caller authenticated"),
            Err(e) => tracing::warn!(error = %e, "caller rejected"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-session-secret-that-is-long-enough-123";

    fn authenticator(with_sessions: bool) -> Authenticator {
        Authenticator::new(
            ApiKeyVerifier::new(&["choir-key".to_string()]),
            with_sessions.then(|| SessionVerifier::new(SECRET)),
        )
    }

    #[tokio::test]
    async fn test_missing_credential_is_rejected() {
        let err = authenticator(true).verify(&CallerCredential::Missing).await.unwrap_err();
        assert_eq!(err, AuthError::Missing);
    }

    #[tokio::test]
    async fn test_api_key_via_header_or_bearer() {
        let auth = authenticator(false);
        let header = auth.verify(&CallerCredential::ApiKey("choir-key".into())).await.unwrap();
        assert_eq!(header.method, AuthMethod::ApiKey);

        let bearer = auth.verify(&CallerCredential::Bearer("choir-key".into())).await.unwrap();
        assert_eq!(bearer, header);

        let wrong = auth.verify(&CallerCredential::ApiKey("wrong".into())).await.unwrap_err();
        assert_eq!(wrong, AuthError::InvalidApiKey);
    }

    #[tokio::test]
    async fn test_session_tokens() {
        let sessions = SessionVerifier::new(SECRET);
        let admin = sessions.issue("pastor@example.org", &[ADMIN_ROLE], 300).unwrap();
        let member = sessions.issue("member@example.org", &["member"], 300).unwrap();

        let auth = authenticator(true);
        let caller = auth.verify(&CallerCredential::Bearer(admin.clone())).await.unwrap();
        assert_eq!(caller.method, AuthMethod::Session);
        assert_eq!(caller.subject, "pastor@example.org");

        let err = auth.verify(&CallerCredential::SessionCookie(member)).await.unwrap_err();
        assert_eq!(err, AuthError::InsufficientRole);

        let disabled = authenticator(false)
            .verify(&CallerCredential::Bearer(admin))
            .await
            .unwrap_err();
        assert_eq!(disabled, AuthError::SessionsDisabled);
    }

    #[test]
    fn test_auth_error_status_mapping() {
        assert!(matches!(AppError::from(AuthError::Missing), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from(AuthError::InsufficientRole), AppError::Forbidden(_)));
    }
}
