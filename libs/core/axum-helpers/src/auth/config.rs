use core_config::{ConfigError, FromEnv, env_list, env_optional};

/// Caller authentication settings.
///
/// - `API_KEYS` (required): comma-separated accepted keys
/// - `SESSION_JWT_SECRET` (optional, min 32 chars): enables admin session tokens
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub api_keys: Vec<String>,
    pub session_secret: Option<String>,
}

impl FromEnv for AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_keys = env_list("API_KEYS");
        if api_keys.is_empty() {
            return Err(ConfigError::MissingEnvVar("API_KEYS".to_string()));
        }

        let session_secret = env_optional("SESSION_JWT_SECRET");
        if let Some(secret) = &session_secret {
            if secret.len() < 32 {
                return Err(ConfigError::ParseError {
                    key: "SESSION_JWT_SECRET".to_string(),
                    details: format!("must be at least 32 characters (got {})", secret.len()),
                });
            }
        }

        Ok(Self {
            api_keys,
            session_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("API_KEYS", Some("one, two")),
                ("SESSION_JWT_SECRET", None::<&str>),
            ],
            || {
                let config = AuthConfig::from_env().unwrap();
                assert_eq!(config.api_keys, vec!["one", "two"]);
                assert!(config.session_secret.is_none());
            },
        );
    }

    #[test]
    fn test_api_keys_required() {
        temp_env::with_var_unset("API_KEYS", || {
            assert!(AuthConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_short_session_secret_rejected() {
        temp_env::with_vars(
            [("API_KEYS", Some("one")), ("SESSION_JWT_SECRET", Some("short"))],
            || {
                let err = AuthConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("SESSION_JWT_SECRET"));
            },
        );
    }
}
