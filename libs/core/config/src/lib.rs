pub mod database;
pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment environment, selected by `APP_ENV`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Value of `key`, or `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Value of `key`, or an error when unset
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Trimmed value of `key`; unset and blank both give `None`
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse `key` into `T`, falling back to `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("Production"), || {
            assert!(Environment::from_env().is_production());
        });
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("SITE_NAME", Some("My Blog"), || {
            assert_eq!(env_or_default("SITE_NAME", "Mail Alerts"), "My Blog");
        });
        temp_env::with_var_unset("SITE_NAME", || {
            assert_eq!(env_or_default("SITE_NAME", "Mail Alerts"), "Mail Alerts");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("MAIL_ALERTS_WEBHOOK_URL", Some("   "), || {
            assert_eq!(env_optional("MAIL_ALERTS_WEBHOOK_URL"), None);
        });
        temp_env::with_var("MAIL_ALERTS_WEBHOOK_URL", Some(" https://x.test/h "), || {
            assert_eq!(
                env_optional("MAIL_ALERTS_WEBHOOK_URL").as_deref(),
                Some("https://x.test/h")
            );
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var_unset("WEBHOOK_TIMEOUT_SECS", || {
            assert_eq!(env_parse("WEBHOOK_TIMEOUT_SECS", 10u64).unwrap(), 10);
        });
        temp_env::with_var("WEBHOOK_TIMEOUT_SECS", Some("5"), || {
            assert_eq!(env_parse("WEBHOOK_TIMEOUT_SECS", 10u64).unwrap(), 5);
        });
        temp_env::with_var("WEBHOOK_TIMEOUT_SECS", Some("soon"), || {
            let err = env_parse("WEBHOOK_TIMEOUT_SECS", 10u64).unwrap_err();
            assert!(err.to_string().contains("WEBHOOK_TIMEOUT_SECS"));
        });
    }
}
