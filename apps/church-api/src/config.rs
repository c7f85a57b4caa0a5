use axum_helpers::AuthConfig;
use core_config::{AppInfo, FromEnv, app_info, env_parse, server::ServerConfig};
use database::mongodb::MongoConfig;
use std::time::Duration;

pub use core_config::Environment;

/// Everything the server reads from the environment at startup.
///
/// The push provider is configured separately by
/// `domain_notifications::providers::provider_from_env`.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub auth: AuthConfig,
    /// Deadline for one whole dispatch batch (`PUSH_DISPATCH_TIMEOUT_SECS`)
    pub dispatch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?.with_app_name(app.name);
        let server = ServerConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let dispatch_timeout = Duration::from_secs(env_parse("PUSH_DISPATCH_TIMEOUT_SECS", 30)?);

        Ok(Self {
            app,
            mongodb,
            server,
            environment,
            auth,
            dispatch_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_env<F: FnOnce()>(overrides: &[(&'static str, Option<&'static str>)], f: F) {
        let mut vars: Vec<(&str, Option<&str>)> = vec![
            ("MONGODB_URL", Some("mongodb://localhost:27017")),
            ("MONGODB_DATABASE", Some("church_test")),
            ("MONGODB_APP_NAME", None),
            ("API_KEYS", Some("usher-key")),
            ("SESSION_JWT_SECRET", None),
            ("PUSH_DISPATCH_TIMEOUT_SECS", None),
            ("PORT", None),
        ];
        for (key, value) in overrides {
            if let Some(slot) = vars.iter_mut().find(|(k, _)| k == key) {
                slot.1 = *value;
            }
        }
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.dispatch_timeout, Duration::from_secs(30));
            assert_eq!(config.mongodb.database, "church_test");
            assert_eq!(config.mongodb.app_name.as_deref(), Some("church_api"));
            assert_eq!(config.auth.api_keys, vec!["usher-key".to_string()]);
            assert_eq!(config.server.port, 8080);
        });
    }

    #[test]
    fn test_dispatch_timeout_override() {
        with_env(&[("PUSH_DISPATCH_TIMEOUT_SECS", Some("5"))], || {
            assert_eq!(
                Config::from_env().unwrap().dispatch_timeout,
                Duration::from_secs(5)
            );
        });
    }

    #[test]
    fn test_dispatch_timeout_must_be_numeric() {
        with_env(&[("PUSH_DISPATCH_TIMEOUT_SECS", Some("half a minute"))], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("PUSH_DISPATCH_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn test_api_keys_required() {
        with_env(&[("API_KEYS", None)], || {
            assert!(Config::from_env().is_err());
        });
    }
}
