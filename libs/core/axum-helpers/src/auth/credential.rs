use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use std::convert::Infallible;

/// Header carrying an API key.
pub const API_KEY_HEADER: &str = "x-api-key";

const SESSION_COOKIE: &str = "access_token";

/// Whatever the caller presented, unverified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerCredential {
    /// `X-API-Key` header
    ApiKey(String),
    /// `Authorization: Bearer` value; either an API key or a session JWT
    Bearer(String),
    /// `access_token` cookie
    SessionCookie(String),
    Missing,
}

impl CallerCredential {
    /// Precedence: API key header, bearer token, session cookie.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(key) = header_str(headers, API_KEY_HEADER) {
            return Self::ApiKey(key.to_string());
        }

        if let Some(token) = header_str(headers, "authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            return Self::Bearer(token.to_string());
        }

        header_str(headers, "cookie")
            .and_then(|cookies| {
                cookies.split(';').find_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
                })
            })
            .map(Self::SessionCookie)
            .unwrap_or(Self::Missing)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for CallerCredential
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
