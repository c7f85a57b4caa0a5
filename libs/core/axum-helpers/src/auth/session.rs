use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthError, AuthMethod, Caller};

/// Role required to send notifications with a session token.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// HS256 session tokens issued by the admin login flow.
#[derive(Clone)]
pub struct SessionVerifier {
    secret: String,
}

impl SessionVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Three dot-separated segments.
    pub fn looks_like_jwt(token: &str) -> bool {
        token.split('.').count() == 3
    }

    pub fn issue(&self, subject: &str, roles: &[&str], ttl_seconds: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: subject.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidSession(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Caller, AuthError> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::InvalidSession(e.to_string()))?;

        if !data.claims.roles.iter().any(|r| r == ADMIN_ROLE) {
            return Err(AuthError::InsufficientRole);
        }

        Ok(Caller {
            subject: data.claims.sub,
            method: AuthMethod::Session,
        })
    }
}
